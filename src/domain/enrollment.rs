// ==========================================
// 高校选课系统 - 选课记录实体
// ==========================================
// 依据: 选课引擎设计说明 - 数据模型 / 状态机
// 红线: 记录只增改不删; "退选"是状态迁移而非删除
// ==========================================

use crate::domain::types::EnrollmentStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 选课记录
///
/// 一条记录绑定一个学生与一个教学班。position 仅在
/// WAITLISTED 状态下有意义, 定义候补队列的 FIFO 次序,
/// 且同一教学班内始终保持从 1 起的连续编号。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    /// 记录 ID
    pub enrollment_id: String,
    /// 学号
    pub student_id: String,
    /// 教学班 ID
    pub section_id: String,
    /// 当前状态
    pub status: EnrollmentStatus,
    /// 候补序号(仅 WAITLISTED 有效)
    pub position: Option<i64>,
    /// 退选/晋升跳过原因(机器码, 终态时记录)
    pub drop_reason: Option<String>,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 最近一次状态变更时间
    pub status_changed_at: DateTime<Utc>,
}

impl Enrollment {
    /// 创建已选入记录
    pub fn new_enrolled(student_id: String, section_id: String) -> Self {
        let now = Utc::now();
        Self {
            enrollment_id: Uuid::new_v4().to_string(),
            student_id,
            section_id,
            status: EnrollmentStatus::Enrolled,
            position: None,
            drop_reason: None,
            created_at: now,
            status_changed_at: now,
        }
    }

    /// 创建候补记录
    pub fn new_waitlisted(student_id: String, section_id: String, position: i64) -> Self {
        let now = Utc::now();
        Self {
            enrollment_id: Uuid::new_v4().to_string(),
            student_id,
            section_id,
            status: EnrollmentStatus::Waitlisted,
            position: Some(position),
            drop_reason: None,
            created_at: now,
            status_changed_at: now,
        }
    }

    /// 是否仍占用名额或候补位(非终态)
    pub fn is_live(&self) -> bool {
        !self.status.is_terminal()
    }
}
