// ==========================================
// 高校选课系统 - 课程与教学班实体
// ==========================================
// 依据: 选课引擎设计说明 - 数据模型
// 红线: enrolled_count/waitlisted_count 不落冗余列,
//       始终在同一事务内由选课记录行推导
// ==========================================

use crate::domain::types::SectionStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Course - 课程主数据
// ==========================================

/// 课程主数据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    /// 课程代码(如 CS101)
    pub course_code: String,
    /// 课程名称
    pub title: String,
    /// 开课院系
    pub department: String,
    /// 学分
    pub credit_hours: f64,
    /// 先修课程代码集合
    pub prerequisites: Vec<String>,
}

// ==========================================
// CourseSection - 教学班
// ==========================================

/// 教学班
///
/// 隶属一门课程和一个学期; capacity 仅约束 ENROLLED 记录数,
/// 候补名额由 waitlist_capacity 单独约束(0 表示不开候补)。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseSection {
    /// 教学班 ID
    pub section_id: String,
    /// 课程代码
    pub course_code: String,
    /// 学期 ID
    pub term_id: String,
    /// 班号(如 01 / 02)
    pub section_no: String,
    /// 任课教师
    pub instructor: String,
    /// 容量(ENROLLED 上限, >= 0)
    pub capacity: i64,
    /// 候补名额上限
    pub waitlist_capacity: i64,
    /// 生命周期状态
    pub status: SectionStatus,
    /// 创建时间
    pub created_at: DateTime<Utc>,
}

impl CourseSection {
    /// 教学班生命周期是否允许接收选课
    pub fn is_open(&self) -> bool {
        self.status == SectionStatus::Open
    }
}

// ==========================================
// SectionOccupancy - 教学班占用快照
// ==========================================

/// 教学班占用快照(由选课记录行推导, 事务内读取)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SectionOccupancy {
    /// 已选入人数
    pub enrolled_count: i64,
    /// 候补人数
    pub waitlisted_count: i64,
}

impl SectionOccupancy {
    /// 剩余可晋升/可选入的空位数
    pub fn free_seats(&self, capacity: i64) -> i64 {
        (capacity - self.enrolled_count).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_seats_never_negative() {
        let occ = SectionOccupancy {
            enrolled_count: 35,
            waitlisted_count: 4,
        };
        // 容量被管理员下调后, 空位按 0 处理而不是负数
        assert_eq!(occ.free_seats(30), 0);
        assert_eq!(occ.free_seats(40), 5);
    }
}
