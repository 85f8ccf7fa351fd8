// ==========================================
// 高校选课系统 - 领域类型定义
// ==========================================
// 依据: 选课引擎设计说明 - 数据模型
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 选课记录状态 (Enrollment Status)
// ==========================================
// 红线: 状态只能沿许可边迁移, 终态记录永不删除
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrollmentStatus {
    Enrolled,   // 已选入(占用容量)
    Waitlisted, // 候补中(持有 position)
    Dropped,    // 已退选(终态)
    Completed,  // 已完成(学期结课, 终态)
}

impl EnrollmentStatus {
    /// 是否为终态(不再占用名额, 不再参与查重)
    pub fn is_terminal(&self) -> bool {
        matches!(self, EnrollmentStatus::Dropped | EnrollmentStatus::Completed)
    }

    /// 状态机许可边校验
    ///
    /// 许可边:
    /// - WAITLISTED -> ENROLLED (仅候补晋升)
    /// - ENROLLED/WAITLISTED -> DROPPED (退选)
    /// - ENROLLED -> COMPLETED (结课批处理)
    pub fn can_transition_to(&self, target: EnrollmentStatus) -> bool {
        matches!(
            (self, target),
            (EnrollmentStatus::Waitlisted, EnrollmentStatus::Enrolled)
                | (EnrollmentStatus::Enrolled, EnrollmentStatus::Dropped)
                | (EnrollmentStatus::Waitlisted, EnrollmentStatus::Dropped)
                | (EnrollmentStatus::Enrolled, EnrollmentStatus::Completed)
        )
    }

    /// 从字符串解析状态
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "ENROLLED" => EnrollmentStatus::Enrolled,
            "WAITLISTED" => EnrollmentStatus::Waitlisted,
            "COMPLETED" => EnrollmentStatus::Completed,
            _ => EnrollmentStatus::Dropped,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Enrolled => "ENROLLED",
            EnrollmentStatus::Waitlisted => "WAITLISTED",
            EnrollmentStatus::Dropped => "DROPPED",
            EnrollmentStatus::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 学生账户状态 (Student Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StudentStatus {
    Active,     // 在读
    Inactive,   // 停用(休学/退学)
    Unverified, // 未完成身份核验
}

impl StudentStatus {
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "ACTIVE" => StudentStatus::Active,
            "UNVERIFIED" => StudentStatus::Unverified,
            _ => StudentStatus::Inactive,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            StudentStatus::Active => "ACTIVE",
            StudentStatus::Inactive => "INACTIVE",
            StudentStatus::Unverified => "UNVERIFIED",
        }
    }
}

impl fmt::Display for StudentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 限制类型 (Hold Type)
// ==========================================
// 任何一个处于激活状态的限制都会阻断选课
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HoldType {
    Financial,    // 财务限制(欠费)
    Academic,     // 学业限制(学业警告)
    Disciplinary, // 纪律限制(处分未解除)
}

impl HoldType {
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "FINANCIAL" => HoldType::Financial,
            "DISCIPLINARY" => HoldType::Disciplinary,
            _ => HoldType::Academic,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            HoldType::Financial => "FINANCIAL",
            HoldType::Academic => "ACADEMIC",
            HoldType::Disciplinary => "DISCIPLINARY",
        }
    }
}

impl fmt::Display for HoldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 教学班生命周期状态 (Section Status)
// ==========================================
// 满员不是生命周期状态: 容量归 enrolled_count 判定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SectionStatus {
    Open,      // 正常开课
    Cancelled, // 已取消
}

impl SectionStatus {
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "OPEN" => SectionStatus::Open,
            _ => SectionStatus::Cancelled,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            SectionStatus::Open => "OPEN",
            SectionStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for SectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 学期 (Semester)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Semester {
    Spring, // 春季学期
    Summer, // 夏季小学期
    Fall,   // 秋季学期
}

impl Semester {
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "SPRING" => Semester::Spring,
            "SUMMER" => Semester::Summer,
            _ => Semester::Fall,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            Semester::Spring => "SPRING",
            Semester::Summer => "SUMMER",
            Semester::Fall => "FALL",
        }
    }
}

impl fmt::Display for Semester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}
