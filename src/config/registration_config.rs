// ==========================================
// 高校选课系统 - 配置管理器
// ==========================================
// 依据: 选课引擎设计说明 - 配置项全集
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::registration_config_trait::RegistrationConfigReader;
use crate::db::open_sqlite_connection;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    /// 学期学分上限
    pub const MAX_TERM_CREDITS: &str = "registration/max_term_credits";
    /// 允许重修的成绩集合 (JSON 数组)
    pub const REPEATABLE_GRADES: &str = "registration/repeatable_grades";
    /// 视为及格的成绩集合 (JSON 数组)
    pub const PASSING_GRADES: &str = "registration/passing_grades";
    /// 晋升任务最大重试次数
    pub const PROMOTION_MAX_RETRIES: &str = "promotion/max_retries";
    /// 定时扫描间隔(秒)
    pub const SWEEP_INTERVAL_SECS: &str = "promotion/sweep_interval_secs";
}

// ==========================================
// RegistrationPolicy - 规则引擎用的配置快照
// ==========================================

/// 规则引擎用的配置快照
///
/// 在 try_enroll / try_promote 的事务内一次性加载,
/// 保证同一次校验使用同一组配置值。
#[derive(Debug, Clone)]
pub struct RegistrationPolicy {
    /// 学期学分上限
    pub max_term_credits: f64,
    /// 允许重修的成绩集合
    pub repeatable_grades: Vec<String>,
    /// 视为及格的成绩集合
    pub passing_grades: Vec<String>,
}

impl Default for RegistrationPolicy {
    fn default() -> Self {
        Self {
            max_term_credits: 18.0,
            repeatable_grades: vec!["F", "W", "D", "D-"]
                .into_iter()
                .map(String::from)
                .collect(),
            passing_grades: vec!["A", "A-", "B+", "B", "B-", "C+", "C", "C-"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl RegistrationPolicy {
    /// 从已打开的连接读取配置快照（事务内可用）
    ///
    /// # 说明
    /// - 缺失或格式错误的配置项回落到默认值, 不阻断选课
    pub fn load(conn: &Connection) -> Self {
        let mut policy = Self::default();

        if let Some(v) = read_global_key(conn, config_keys::MAX_TERM_CREDITS) {
            if let Ok(n) = v.parse::<f64>() {
                policy.max_term_credits = n;
            }
        }
        if let Some(v) = read_global_key(conn, config_keys::REPEATABLE_GRADES) {
            if let Ok(grades) = serde_json::from_str::<Vec<String>>(&v) {
                policy.repeatable_grades = grades;
            }
        }
        if let Some(v) = read_global_key(conn, config_keys::PASSING_GRADES) {
            if let Ok(grades) = serde_json::from_str::<Vec<String>>(&v) {
                policy.passing_grades = grades;
            }
        }

        policy
    }

    /// 成绩是否允许重修
    pub fn is_repeatable(&self, grade: &str) -> bool {
        self.repeatable_grades.iter().any(|g| g == grade)
    }

    /// 成绩是否及格
    pub fn is_passing(&self, grade: &str) -> bool {
        self.passing_grades.iter().any(|g| g == grade)
    }
}

/// 读取 global scope 配置值（连接已持有, 查询失败视为缺失）
fn read_global_key(conn: &Connection, key: &str) -> Option<String> {
    conn.query_row(
        "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
        params![key],
        |row| row.get::<_, String>(0),
    )
    .ok()
}

// ==========================================
// RegistrationConfigManager - 配置管理器
// ==========================================
pub struct RegistrationConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl RegistrationConfigManager {
    /// 创建新的 RegistrationConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建配置管理器
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self
            .get_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 写入/覆写 global scope 配置值
    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;

        Ok(())
    }

    /// 读取规则引擎配置快照
    pub fn policy(&self) -> Result<RegistrationPolicy, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        Ok(RegistrationPolicy::load(&conn))
    }
}

// ==========================================
// RegistrationConfigReader 实现
// ==========================================
#[async_trait]
impl RegistrationConfigReader for RegistrationConfigManager {
    async fn get_max_term_credits(&self) -> Result<f64, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::MAX_TERM_CREDITS, "18")?;
        Ok(value.parse::<f64>().unwrap_or(18.0))
    }

    async fn get_repeatable_grades(&self) -> Result<Vec<String>, Box<dyn Error>> {
        let value = self.get_config_or_default(
            config_keys::REPEATABLE_GRADES,
            r#"["F","W","D","D-"]"#,
        )?;
        Ok(serde_json::from_str(&value)
            .unwrap_or_else(|_| RegistrationPolicy::default().repeatable_grades))
    }

    async fn get_passing_grades(&self) -> Result<Vec<String>, Box<dyn Error>> {
        let value = self.get_config_or_default(
            config_keys::PASSING_GRADES,
            r#"["A","A-","B+","B","B-","C+","C","C-"]"#,
        )?;
        Ok(serde_json::from_str(&value)
            .unwrap_or_else(|_| RegistrationPolicy::default().passing_grades))
    }

    async fn get_promotion_max_retries(&self) -> Result<i32, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::PROMOTION_MAX_RETRIES, "3")?;
        Ok(value.parse::<i32>().unwrap_or(3))
    }

    async fn get_sweep_interval_secs(&self) -> Result<u64, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::SWEEP_INTERVAL_SECS, "300")?;
        Ok(value.parse::<u64>().unwrap_or(300))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn setup() -> Arc<Mutex<Connection>> {
        let conn = Connection::open_in_memory().unwrap();
        db::configure_sqlite_connection(&conn).unwrap();
        db::init_schema(&conn).unwrap();
        Arc::new(Mutex::new(conn))
    }

    #[tokio::test]
    async fn test_defaults_when_unset() {
        let conn = setup();
        let manager = RegistrationConfigManager::from_connection(conn).unwrap();

        assert_eq!(manager.get_max_term_credits().await.unwrap(), 18.0);
        assert_eq!(
            manager.get_repeatable_grades().await.unwrap(),
            vec!["F", "W", "D", "D-"]
        );
        assert_eq!(manager.get_promotion_max_retries().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_override_and_policy_snapshot() {
        let conn = setup();
        let manager = RegistrationConfigManager::from_connection(conn.clone()).unwrap();

        manager
            .set_config_value(config_keys::MAX_TERM_CREDITS, "21")
            .unwrap();
        assert_eq!(manager.get_max_term_credits().await.unwrap(), 21.0);

        let policy = manager.policy().unwrap();
        assert_eq!(policy.max_term_credits, 21.0);
        assert!(policy.is_repeatable("F"));
        assert!(!policy.is_repeatable("C"));
        assert!(policy.is_passing("C"));
        assert!(!policy.is_passing("D"));
    }
}
