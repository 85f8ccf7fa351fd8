// ==========================================
// 高校选课系统 - API 层
// ==========================================
// 职责: 提供业务 API 门面, 供 HTTP 控制器与运维入口调用
// ==========================================

pub mod error;
pub mod registration_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use registration_api::{RegistrationApi, SweepReport};
