// ==========================================
// 高校选课系统 - 历史成绩实体
// ==========================================
// 依据: 选课引擎设计说明 - 数据模型
// 说明: 重修规则与先修规则的数据来源
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 历史成绩记录
///
/// 学生已完成课程的最终成绩。成绩以等级字符串存储
/// (A / A- / B+ / ... / D / D- / F / W), 是否及格、
/// 是否允许重修由配置的成绩集合判定, 不在实体内硬编码。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcademicRecord {
    /// 记录 ID
    pub record_id: String,
    /// 学号
    pub student_id: String,
    /// 课程代码
    pub course_code: String,
    /// 取得成绩的学期 ID
    pub term_id: String,
    /// 最终成绩等级
    pub grade: String,
    /// 成绩登记日期
    pub completed_on: NaiveDate,
}
