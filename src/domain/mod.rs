// ==========================================
// 高校选课系统 - 领域模型层
// ==========================================
// 依据: 选课引擎设计说明 - 数据模型
// ==========================================
// 职责: 定义领域实体、类型、状态机
// 红线: 不含数据访问逻辑,不含规则引擎逻辑
// ==========================================

pub mod academic_record;
pub mod course;
pub mod enrollment;
pub mod student;
pub mod term;
pub mod types;

// 重导出核心类型
pub use academic_record::AcademicRecord;
pub use course::{Course, CourseSection, SectionOccupancy};
pub use enrollment::Enrollment;
pub use student::{Hold, Student, TimeTicket};
pub use term::Term;
pub use types::{EnrollmentStatus, HoldType, SectionStatus, Semester, StudentStatus};
