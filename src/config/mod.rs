// ==========================================
// 高校选课系统 - 配置层
// ==========================================
// 依据: 选课引擎设计说明 - 配置项全集
// ==========================================
// 职责: 系统配置管理
// 存储: config_kv 表
// ==========================================

pub mod registration_config;
pub mod registration_config_trait;

// 重导出核心配置管理器
pub use registration_config::{config_keys, RegistrationConfigManager, RegistrationPolicy};
pub use registration_config_trait::RegistrationConfigReader;
