// ==========================================
// 高校选课系统 - 选课规则目录
// ==========================================
// 依据: 选课引擎设计说明 - 规则目录
// 红线: 规则是纯谓词, 只读取已取数的快照, 不访问数据库
// 红线: 每条规则必须输出带类型的违规值, 不抛异常
// ==========================================

use crate::config::RegistrationPolicy;
use crate::domain::{
    AcademicRecord, Course, CourseSection, Enrollment, EnrollmentStatus, Hold, Student,
    StudentStatus, Term, TimeTicket,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// 违规类型 (Violation)
// ==========================================

/// 教学班不可选的具体原因
///
/// 先判取消、后判学期关闭: 已取消教学班在已关闭学期里
/// 报告的是"已取消"而不是"学期关闭"。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnavailableReason {
    SectionCancelled, // 教学班已取消
    TermClosed,       // 学期注册已关闭(退改选截止)
}

/// 选课违规
///
/// 每个变体携带调用方渲染精确消息所需的全部结构化数据,
/// 调用方不需要二次取数。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "violation", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Violation {
    /// 学生账户不可用(停用/未核验)
    StudentNotActive { status: StudentStatus },
    /// 存在未解除的选课限制(携带全部激活限制, 一次性展示)
    RegistrationHold { holds: Vec<Hold> },
    /// 选课窗口未开放(唯一允许向调用方暴露未来时间戳的规则)
    RegistrationNotOpen { opens_at: DateTime<Utc> },
    /// 教学班不可选(已取消或学期关闭, 与满员无关)
    CourseSectionUnavailable { reason: UnavailableReason },
    /// 同一教学班下已存在非终态记录
    DuplicateEnrollment { existing_status: EnrollmentStatus },
    /// 已修课程成绩不允许重修
    RepeatCourse {
        course_code: String,
        existing_grade: String,
    },
    /// 先修课程未满足
    PrerequisiteNotMet { missing: Vec<String> },
    /// 学期学分超限(候补学分不计入 current)
    CreditLimitExceeded {
        current: f64,
        attempted: f64,
        max: f64,
    },
    /// 名额与候补名额均已满
    EnrollmentCapacityExceeded {
        capacity: i64,
        waitlist_capacity: i64,
    },
}

impl Violation {
    /// 稳定机器码(对外接口契约, 不随文案变化)
    pub fn code(&self) -> &'static str {
        match self {
            Violation::StudentNotActive { .. } => "STUDENT_NOT_ACTIVE",
            Violation::RegistrationHold { .. } => "REGISTRATION_HOLD",
            Violation::RegistrationNotOpen { .. } => "REGISTRATION_NOT_OPEN",
            Violation::CourseSectionUnavailable { .. } => "COURSE_SECTION_UNAVAILABLE",
            Violation::DuplicateEnrollment { .. } => "DUPLICATE_ENROLLMENT",
            Violation::RepeatCourse { .. } => "REPEAT_COURSE",
            Violation::PrerequisiteNotMet { .. } => "PREREQUISITE_NOT_MET",
            Violation::CreditLimitExceeded { .. } => "CREDIT_LIMIT_EXCEEDED",
            Violation::EnrollmentCapacityExceeded { .. } => "ENROLLMENT_CAPACITY_EXCEEDED",
        }
    }

    /// 本地化的用户可读消息
    pub fn message(&self) -> String {
        use crate::i18n::t_with_args;

        match self {
            Violation::StudentNotActive { status } => t_with_args(
                "violation.student_not_active",
                &[("status", status.to_db_str())],
            ),
            Violation::RegistrationHold { holds } => t_with_args(
                "violation.registration_hold",
                &[("count", &holds.len().to_string())],
            ),
            Violation::RegistrationNotOpen { opens_at } => t_with_args(
                "violation.registration_not_open",
                &[("opens_at", &opens_at.to_rfc3339())],
            ),
            Violation::CourseSectionUnavailable { .. } => {
                crate::i18n::t("violation.section_unavailable")
            }
            Violation::DuplicateEnrollment { .. } => {
                crate::i18n::t("violation.duplicate_enrollment")
            }
            Violation::RepeatCourse {
                course_code,
                existing_grade,
            } => t_with_args(
                "violation.repeat_course",
                &[("course", course_code), ("grade", existing_grade)],
            ),
            Violation::PrerequisiteNotMet { missing } => t_with_args(
                "violation.prerequisite_not_met",
                &[("missing", &missing.join(", "))],
            ),
            Violation::CreditLimitExceeded {
                current,
                attempted,
                max,
            } => t_with_args(
                "violation.credit_limit_exceeded",
                &[
                    ("current", &current.to_string()),
                    ("attempted", &attempted.to_string()),
                    ("max", &max.to_string()),
                ],
            ),
            Violation::EnrollmentCapacityExceeded { .. } => {
                crate::i18n::t("violation.capacity_exceeded")
            }
        }
    }
}

// ==========================================
// 规则 1: 学生账户状态
// ==========================================

/// 学生账户不在读或未核验时拒绝
pub fn check_student_active(student: &Student) -> Option<Violation> {
    if student.is_active() {
        None
    } else {
        Some(Violation::StudentNotActive {
            status: student.status,
        })
    }
}

// ==========================================
// 规则 2: 选课限制
// ==========================================

/// 存在任意激活限制即拒绝, 违规值携带全部激活限制
/// (调用方一次展示全部, 而不是只给第一条)
pub fn check_registration_hold(holds: &[Hold]) -> Option<Violation> {
    let active: Vec<Hold> = holds.iter().filter(|h| h.is_active).cloned().collect();
    if active.is_empty() {
        None
    } else {
        Some(Violation::RegistrationHold { holds: active })
    }
}

// ==========================================
// 规则 3: 选课时间票窗口
// ==========================================

/// asOf 早于该生时间票窗口时拒绝
///
/// 未分配时间票的学生回落到学期统一开放时间。
/// 窗口的关闭侧由规则 4 的学期关闭检查负责。
pub fn check_registration_window(
    ticket: Option<&TimeTicket>,
    term: &Term,
    as_of: DateTime<Utc>,
) -> Option<Violation> {
    let opens_at = match ticket {
        Some(t) => t.opens_at.max(term.registration_start),
        None => term.registration_start,
    };

    if as_of < opens_at {
        Some(Violation::RegistrationNotOpen { opens_at })
    } else {
        None
    }
}

// ==========================================
// 规则 4: 教学班可用性
// ==========================================

/// 教学班已取消或学期注册已关闭时拒绝
///
/// 满员不属于可用性问题: 满员走容量路由(规则 9)。
pub fn check_section_available(
    section: &CourseSection,
    term: &Term,
    as_of: DateTime<Utc>,
) -> Option<Violation> {
    if !section.is_open() {
        return Some(Violation::CourseSectionUnavailable {
            reason: UnavailableReason::SectionCancelled,
        });
    }
    if as_of.date_naive() > term.add_drop_deadline {
        return Some(Violation::CourseSectionUnavailable {
            reason: UnavailableReason::TermClosed,
        });
    }
    None
}

// ==========================================
// 规则 5: 重复选课
// ==========================================

/// 同一 (学生, 教学班) 已存在非终态记录时拒绝
/// (拒绝而不是去重)
pub fn check_duplicate_enrollment(live_pair_enrollments: &[Enrollment]) -> Option<Violation> {
    live_pair_enrollments
        .iter()
        .find(|e| e.is_live())
        .map(|e| Violation::DuplicateEnrollment {
            existing_status: e.status,
        })
}

// ==========================================
// 规则 6: 重修限制
// ==========================================

/// 已以不可重修成绩完成同一门课程时拒绝
///
/// 可重修成绩集合由配置给出(默认 F / W / D / D-)。
pub fn check_repeat_course(
    course: &Course,
    records: &[AcademicRecord],
    policy: &RegistrationPolicy,
) -> Option<Violation> {
    records
        .iter()
        .filter(|r| r.course_code == course.course_code)
        .find(|r| !policy.is_repeatable(&r.grade))
        .map(|r| Violation::RepeatCourse {
            course_code: course.course_code.clone(),
            existing_grade: r.grade.clone(),
        })
}

// ==========================================
// 规则 7: 先修课程
// ==========================================

/// 任一先修课程缺少及格的完成成绩时拒绝
pub fn check_prerequisites(
    course: &Course,
    records: &[AcademicRecord],
    policy: &RegistrationPolicy,
) -> Option<Violation> {
    let missing: Vec<String> = course
        .prerequisites
        .iter()
        .filter(|prereq| {
            !records
                .iter()
                .any(|r| &r.course_code == *prereq && policy.is_passing(&r.grade))
        })
        .cloned()
        .collect();

    if missing.is_empty() {
        None
    } else {
        Some(Violation::PrerequisiteNotMet { missing })
    }
}

// ==========================================
// 规则 8: 学期学分上限
// ==========================================

/// current + attempted 超过学期上限时拒绝
///
/// current 只统计 ENROLLED 学分, 候补学分不计入。
pub fn check_credit_limit(
    enrolled_credits: f64,
    attempted_credits: f64,
    policy: &RegistrationPolicy,
) -> Option<Violation> {
    if enrolled_credits + attempted_credits > policy.max_term_credits {
        Some(Violation::CreditLimitExceeded {
            current: enrolled_credits,
            attempted: attempted_credits,
            max: policy.max_term_credits,
        })
    } else {
        None
    }
}
