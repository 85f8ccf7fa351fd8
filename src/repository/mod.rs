// ==========================================
// 高校选课系统 - 数据仓储层
// ==========================================
// 依据: 选课引擎设计说明 - 仓储操作
// 红线: 选课记录与教学班占用只能经 EnrollmentRepository 改写
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod course_repo;
pub mod enrollment_query;
pub mod enrollment_repo;
pub mod error;
pub mod history_repo;
pub mod record_repo;
pub mod student_repo;
pub mod term_repo;

// 重导出核心仓储
pub use course_repo::{CourseRepository, CourseSectionRepository};
pub use enrollment_query::{EnrollmentQueryFilter, EnrollmentQueryRepository, EnrollmentView};
pub use enrollment_repo::{
    EnrollmentDecision, EnrollmentRepository, PromotionOutcome, PromotionSkip, WithdrawalOutcome,
};
pub use error::{RepositoryError, RepositoryResult};
pub use history_repo::{EnrollmentHistoryEntry, EnrollmentHistoryRepository};
pub use record_repo::AcademicRecordRepository;
pub use student_repo::StudentRepository;
pub use term_repo::TermRepository;
