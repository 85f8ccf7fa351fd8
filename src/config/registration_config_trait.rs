// ==========================================
// 高校选课系统 - 选课配置读取 Trait
// ==========================================
// 依据: 选课引擎设计说明 - 配置项全集
// 职责: 定义规则引擎与后台任务所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use async_trait::async_trait;
use std::error::Error;

// ==========================================
// RegistrationConfigReader Trait
// ==========================================
// 用途: 选课规则与候补晋升所需的配置读取接口
// 实现者: RegistrationConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait RegistrationConfigReader: Send + Sync {
    /// 获取学期学分上限
    ///
    /// # 默认值
    /// - 18.0
    async fn get_max_term_credits(&self) -> Result<f64, Box<dyn Error>>;

    /// 获取允许重修的成绩集合
    ///
    /// # 默认值
    /// - ["F", "W", "D", "D-"]
    async fn get_repeatable_grades(&self) -> Result<Vec<String>, Box<dyn Error>>;

    /// 获取视为及格的成绩集合（先修判定用）
    ///
    /// # 默认值
    /// - ["A", "A-", "B+", "B", "B-", "C+", "C", "C-"]
    async fn get_passing_grades(&self) -> Result<Vec<String>, Box<dyn Error>>;

    /// 获取晋升任务最大重试次数
    ///
    /// # 默认值
    /// - 3
    async fn get_promotion_max_retries(&self) -> Result<i32, Box<dyn Error>>;

    /// 获取定时扫描间隔（秒）
    ///
    /// # 默认值
    /// - 300
    async fn get_sweep_interval_secs(&self) -> Result<u64, Box<dyn Error>>;
}
