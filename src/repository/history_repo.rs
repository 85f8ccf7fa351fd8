// ==========================================
// 高校选课系统 - 选课流转历史仓储
// ==========================================
// 职责: 记录每一次选课状态迁移, 支撑审计与历史回放
// 红线: Repository 不做业务逻辑,只做数据映射
// 红线: 历史行必须与状态迁移在同一事务内写入
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// 选课流转历史条目
#[derive(Debug, Clone)]
pub struct EnrollmentHistoryEntry {
    pub history_id: String,
    pub enrollment_id: String,
    pub student_id: String,
    pub section_id: String,
    /// 迁移前状态(创建时为 None)
    pub from_status: Option<String>,
    /// 迁移后状态
    pub to_status: String,
    /// 迁移原因(机器码, 如 REGISTERED / PROMOTED / WITHDRAWN / 违规码)
    pub reason: String,
    /// 结构化明细(违规值序列化等)
    pub detail: Option<serde_json::Value>,
    /// 操作方(student / admin / promotion-worker / term-close)
    pub actor: String,
    pub created_at: DateTime<Utc>,
}

impl EnrollmentHistoryEntry {
    pub fn new(
        enrollment_id: &str,
        student_id: &str,
        section_id: &str,
        from_status: Option<&str>,
        to_status: &str,
        reason: &str,
        detail: Option<serde_json::Value>,
        actor: &str,
    ) -> Self {
        Self {
            history_id: Uuid::new_v4().to_string(),
            enrollment_id: enrollment_id.to_string(),
            student_id: student_id.to_string(),
            section_id: section_id.to_string(),
            from_status: from_status.map(String::from),
            to_status: to_status.to_string(),
            reason: reason.to_string(),
            detail,
            actor: actor.to_string(),
            created_at: Utc::now(),
        }
    }
}

// ==========================================
// EnrollmentHistoryRepository - 历史仓储
// ==========================================
pub struct EnrollmentHistoryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl EnrollmentHistoryRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 事务内追加历史行
    ///
    /// 供 EnrollmentRepository 在状态迁移事务中调用,
    /// 保证"迁移"与"留痕"要么都提交要么都回滚。
    pub fn append_with_conn(
        conn: &Connection,
        entry: &EnrollmentHistoryEntry,
    ) -> RepositoryResult<()> {
        conn.execute(
            r#"
            INSERT INTO enrollment_history (
                history_id, enrollment_id, student_id, section_id,
                from_status, to_status, reason, detail, actor, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                entry.history_id,
                entry.enrollment_id,
                entry.student_id,
                entry.section_id,
                entry.from_status,
                entry.to_status,
                entry.reason,
                entry.detail.as_ref().map(|v| v.to_string()),
                entry.actor,
                entry.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// 查询一条选课记录的完整流转历史(时间正序)
    pub fn find_by_enrollment(
        &self,
        enrollment_id: &str,
    ) -> RepositoryResult<Vec<EnrollmentHistoryEntry>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT history_id, enrollment_id, student_id, section_id,
                   from_status, to_status, reason, detail, actor, created_at
            FROM enrollment_history
            WHERE enrollment_id = ?1
            ORDER BY created_at ASC
            "#,
        )?;
        let rows = stmt.query_map(params![enrollment_id], map_entry)?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    /// 查询一个 (学生, 教学班) 组合的全部流转历史
    ///
    /// 用途: 按组合回放选课状态
    pub fn find_by_pair(
        &self,
        student_id: &str,
        section_id: &str,
    ) -> RepositoryResult<Vec<EnrollmentHistoryEntry>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT history_id, enrollment_id, student_id, section_id,
                   from_status, to_status, reason, detail, actor, created_at
            FROM enrollment_history
            WHERE student_id = ?1 AND section_id = ?2
            ORDER BY created_at ASC
            "#,
        )?;
        let rows = stmt.query_map(params![student_id, section_id], map_entry)?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }
}

// ===== 行映射 =====

fn map_entry(row: &Row<'_>) -> rusqlite::Result<EnrollmentHistoryEntry> {
    let detail: Option<String> = row.get(7)?;
    Ok(EnrollmentHistoryEntry {
        history_id: row.get(0)?,
        enrollment_id: row.get(1)?,
        student_id: row.get(2)?,
        section_id: row.get(3)?,
        from_status: row.get(4)?,
        to_status: row.get(5)?,
        reason: row.get(6)?,
        detail: detail.and_then(|s| serde_json::from_str(&s).ok()),
        actor: row.get(8)?,
        created_at: row.get(9)?,
    })
}
