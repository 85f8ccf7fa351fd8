// ==========================================
// 高校选课系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 选课与候补晋升引擎
//           (HTTP 控制器 / 通知 / 账单 / 前端均为外围协作方)
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则与候补晋升
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/schema）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务门面
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{EnrollmentStatus, HoldType, SectionStatus, Semester, StudentStatus};

// 领域实体
pub use domain::{
    AcademicRecord, Course, CourseSection, Enrollment, Hold, SectionOccupancy, Student, Term,
    TimeTicket,
};

// 引擎
pub use engine::{
    EnrollmentEvent, EnrollmentEventPublisher, EnrollmentValidator, NoOpEventPublisher,
    OptionalEventPublisher, PromotionDispatchAdapter, PromotionQueue, PromotionTrigger,
    PromotionWorker, UnavailableReason, ValidationContext, ValidationResult, Violation,
    WaitlistSweeper,
};

// 仓储
pub use repository::{
    EnrollmentDecision, EnrollmentQueryFilter, EnrollmentRepository, PromotionOutcome,
    WithdrawalOutcome,
};

// API
pub use api::{ApiError, ApiResult, RegistrationApi, SweepReport};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "高校选课与候补晋升引擎";

// 数据库版本
pub const DB_VERSION: &str = "v0.1";
