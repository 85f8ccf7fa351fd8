// ==========================================
// 高校选课系统 - 学期实体
// ==========================================
// 依据: 选课引擎设计说明 - 数据模型
// ==========================================

use crate::domain::types::Semester;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// 学期
///
/// 学期的注册窗口是所有选课动作的总闸:
/// registration_start 之前任何人不可选课,
/// add_drop_deadline 之后学期对注册关闭。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Term {
    /// 学期 ID(如 2026-FALL)
    pub term_id: String,
    /// 学年
    pub academic_year: i32,
    /// 学期类型
    pub semester: Semester,
    /// 上课开始日期
    pub start_date: NaiveDate,
    /// 上课结束日期
    pub end_date: NaiveDate,
    /// 退改选截止日期(含当日)
    pub add_drop_deadline: NaiveDate,
    /// 注册开放时间(时间票最早不早于此)
    pub registration_start: DateTime<Utc>,
}

impl Term {
    /// 指定时刻学期是否对注册开放
    ///
    /// 开放区间: [registration_start, add_drop_deadline 当日 24:00)
    pub fn is_registration_open(&self, as_of: DateTime<Utc>) -> bool {
        as_of >= self.registration_start && as_of.date_naive() <= self.add_drop_deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fall_term() -> Term {
        Term {
            term_id: "2026-FALL".to_string(),
            academic_year: 2026,
            semester: Semester::Fall,
            start_date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 12, 20).unwrap(),
            add_drop_deadline: NaiveDate::from_ymd_opt(2026, 9, 12).unwrap(),
            registration_start: Utc.with_ymd_and_hms(2026, 8, 15, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_registration_window_boundaries() {
        let term = fall_term();

        // 开放前
        let before = Utc.with_ymd_and_hms(2026, 8, 14, 23, 59, 59).unwrap();
        assert!(!term.is_registration_open(before));

        // 开放时刻
        assert!(term.is_registration_open(term.registration_start));

        // 截止日当天仍开放
        let deadline_day = Utc.with_ymd_and_hms(2026, 9, 12, 20, 0, 0).unwrap();
        assert!(term.is_registration_open(deadline_day));

        // 截止日次日关闭
        let after = Utc.with_ymd_and_hms(2026, 9, 13, 0, 0, 1).unwrap();
        assert!(!term.is_registration_open(after));
    }
}
