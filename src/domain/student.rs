// ==========================================
// 高校选课系统 - 学生实体
// ==========================================
// 依据: 选课引擎设计说明 - 数据模型
// 说明: 学生主数据 + 限制记录 + 选课时间票
// ==========================================

use crate::domain::types::{HoldType, StudentStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Student - 学生主数据
// ==========================================

/// 学生主数据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    /// 学号
    pub student_id: String,
    /// 姓名
    pub name: String,
    /// 账户状态
    pub status: StudentStatus,
    /// 创建时间
    pub created_at: DateTime<Utc>,
}

impl Student {
    pub fn new(student_id: String, name: String, status: StudentStatus) -> Self {
        Self {
            student_id,
            name,
            status,
            created_at: Utc::now(),
        }
    }

    /// 账户是否允许发起选课(在读且已核验)
    pub fn is_active(&self) -> bool {
        self.status == StudentStatus::Active
    }
}

// ==========================================
// Hold - 选课限制
// ==========================================
// 每条限制独立记录激活/解除状态, 解除后保留历史
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hold {
    /// 限制 ID
    pub hold_id: String,
    /// 学号
    pub student_id: String,
    /// 限制类型
    pub hold_type: HoldType,
    /// 限制原因(展示给学生/管理员)
    pub reason: String,
    /// 是否处于激活状态
    pub is_active: bool,
    /// 设置时间
    pub created_at: DateTime<Utc>,
    /// 解除时间
    pub cleared_at: Option<DateTime<Utc>>,
}

// ==========================================
// TimeTicket - 选课时间票
// ==========================================

/// 选课时间票
///
/// 按优先组(年级/荣誉生等)分配的学期级开放窗口。
/// 窗口开放后持续到学期退改选截止日, 由学期侧统一关闭。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeTicket {
    /// 时间票 ID
    pub ticket_id: String,
    /// 学号
    pub student_id: String,
    /// 学期 ID
    pub term_id: String,
    /// 优先组代码(如 SENIOR / JUNIOR / HONORS)
    pub priority_group: String,
    /// 窗口开放时间
    pub opens_at: DateTime<Utc>,
}

impl TimeTicket {
    /// 指定时刻窗口是否已开放
    pub fn is_open_at(&self, as_of: DateTime<Utc>) -> bool {
        as_of >= self.opens_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_time_ticket_window() {
        let opens_at = Utc.with_ymd_and_hms(2026, 8, 20, 8, 0, 0).unwrap();
        let ticket = TimeTicket {
            ticket_id: "TK001".to_string(),
            student_id: "S001".to_string(),
            term_id: "2026-FALL".to_string(),
            priority_group: "SENIOR".to_string(),
            opens_at,
        };

        assert!(!ticket.is_open_at(opens_at - chrono::Duration::seconds(1)));
        assert!(ticket.is_open_at(opens_at));
        assert!(ticket.is_open_at(opens_at + chrono::Duration::days(3)));
    }
}
