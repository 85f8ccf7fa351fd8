// ==========================================
// 高校选课系统 - 选课校验器
// ==========================================
// 依据: 选课引擎设计说明 - 规则目录 / 校验次序
// 职责: 按固定次序执行规则目录, 首个失败即短路
// 红线: 规则次序是对外契约, 不允许隐式依赖代码顺序以外的语义
// ==========================================
// 次序: 1.账户状态 2.选课限制 3.时间票窗口 4.教学班可用性
//       5.重复选课 6.重修限制 7.先修课程 8.学分上限
// 容量判定(规则 9)不在此处: 它在仓储的提交事务内执行,
// 是"选入还是候补"的路由, 不是拒绝。
// ==========================================

use crate::config::RegistrationPolicy;
use crate::domain::{
    AcademicRecord, Course, CourseSection, Enrollment, Hold, Student, Term, TimeTicket,
};
use crate::engine::rules::{self, Violation};
use chrono::{DateTime, Utc};

// ==========================================
// ValidationSnapshot - 校验输入快照
// ==========================================

/// 校验输入快照
///
/// 由仓储在事务内取数组装; 校验器只读快照, 不访问数据库,
/// 对同一快照的校验是可重复的纯计算。
#[derive(Debug, Clone)]
pub struct ValidationSnapshot {
    pub student: Student,
    /// 该生全部限制记录(激活与否由规则过滤)
    pub holds: Vec<Hold>,
    /// 该生本学期时间票(未分配为 None)
    pub time_ticket: Option<TimeTicket>,
    pub course: Course,
    pub section: CourseSection,
    pub term: Term,
    /// 该生在该教学班下的全部非终态记录
    pub live_pair_enrollments: Vec<Enrollment>,
    /// 该生全部历史成绩
    pub records: Vec<AcademicRecord>,
    /// 该生本学期 ENROLLED 学分合计(候补不计入)
    pub enrolled_credits: f64,
    /// 配置快照
    pub policy: RegistrationPolicy,
}

// ==========================================
// ValidationContext - 校验场景
// ==========================================

/// 校验场景
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationContext {
    /// 新选课请求: 规则 1-8 全跑
    Registration,
    /// 候补晋升复核: 跳过重复检查(记录本身就在队列里),
    /// 容量由晋升方保证, 其余规则重新执行
    Promotion,
}

// ==========================================
// ValidationResult - 校验结果
// ==========================================

/// 校验结果
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationResult {
    Accepted,
    Rejected(Violation),
}

impl ValidationResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationResult::Accepted)
    }
}

// ==========================================
// EnrollmentValidator - 选课校验器
// ==========================================

/// 选课校验器
#[derive(Debug, Clone, Copy, Default)]
pub struct EnrollmentValidator;

impl EnrollmentValidator {
    pub fn new() -> Self {
        Self
    }

    /// 按固定次序执行规则目录
    ///
    /// # 参数
    /// - snapshot: 事务内组装的校验快照
    /// - as_of: 选课动作发生时刻
    /// - context: 校验场景(新选课 / 晋升复核)
    ///
    /// # 返回
    /// - Accepted: 全部规则通过
    /// - Rejected(violation): 首个失败规则的违规值
    pub fn validate(
        &self,
        snapshot: &ValidationSnapshot,
        as_of: DateTime<Utc>,
        context: ValidationContext,
    ) -> ValidationResult {
        if let Some(v) = rules::check_student_active(&snapshot.student) {
            return ValidationResult::Rejected(v);
        }
        if let Some(v) = rules::check_registration_hold(&snapshot.holds) {
            return ValidationResult::Rejected(v);
        }
        if let Some(v) =
            rules::check_registration_window(snapshot.time_ticket.as_ref(), &snapshot.term, as_of)
        {
            return ValidationResult::Rejected(v);
        }
        if let Some(v) = rules::check_section_available(&snapshot.section, &snapshot.term, as_of) {
            return ValidationResult::Rejected(v);
        }
        if context == ValidationContext::Registration {
            if let Some(v) = rules::check_duplicate_enrollment(&snapshot.live_pair_enrollments) {
                return ValidationResult::Rejected(v);
            }
        }
        if let Some(v) =
            rules::check_repeat_course(&snapshot.course, &snapshot.records, &snapshot.policy)
        {
            return ValidationResult::Rejected(v);
        }
        if let Some(v) =
            rules::check_prerequisites(&snapshot.course, &snapshot.records, &snapshot.policy)
        {
            return ValidationResult::Rejected(v);
        }
        if let Some(v) = rules::check_credit_limit(
            snapshot.enrolled_credits,
            snapshot.course.credit_hours,
            &snapshot.policy,
        ) {
            return ValidationResult::Rejected(v);
        }

        ValidationResult::Accepted
    }
}
