// ==========================================
// 高校选课系统 - 学生数据仓储
// ==========================================
// 依据: 选课引擎设计说明 - 数据模型
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::student::{Hold, Student, TimeTicket};
use crate::domain::types::{HoldType, StudentStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

/// 学生仓储
/// 职责: 管理 student / student_hold / time_ticket 表
pub struct StudentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl StudentRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按学号查询学生
    pub fn find_by_id(&self, student_id: &str) -> RepositoryResult<Option<Student>> {
        let conn = self.get_conn()?;
        Self::find_by_id_with_conn(&conn, student_id)
    }

    /// 事务内查询学生（供其他仓储在同一事务中复用）
    pub fn find_by_id_with_conn(
        conn: &Connection,
        student_id: &str,
    ) -> RepositoryResult<Option<Student>> {
        let student = conn
            .query_row(
                "SELECT student_id, name, status, created_at FROM student WHERE student_id = ?1",
                params![student_id],
                map_student,
            )
            .optional()?;
        Ok(student)
    }

    /// 新增学生
    pub fn insert(&self, student: &Student) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO student (student_id, name, status, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                student.student_id,
                student.name,
                student.status.to_db_str(),
                student.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// 更新学生账户状态
    pub fn update_status(&self, student_id: &str, status: StudentStatus) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE student SET status = ?1 WHERE student_id = ?2",
            params![status.to_db_str(), student_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Student".to_string(),
                id: student_id.to_string(),
            });
        }
        Ok(())
    }

    // ===== 选课限制 =====

    /// 设置限制
    pub fn add_hold(&self, hold: &Hold) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO student_hold
                (hold_id, student_id, hold_type, reason, is_active, created_at, cleared_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                hold.hold_id,
                hold.student_id,
                hold.hold_type.to_db_str(),
                hold.reason,
                hold.is_active as i32,
                hold.created_at.to_rfc3339(),
                hold.cleared_at.map(|t| t.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    /// 解除限制(保留历史记录)
    pub fn clear_hold(&self, hold_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE student_hold SET is_active = 0, cleared_at = datetime('now') WHERE hold_id = ?1",
            params![hold_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Hold".to_string(),
                id: hold_id.to_string(),
            });
        }
        Ok(())
    }

    /// 查询学生的全部限制记录
    pub fn find_holds(&self, student_id: &str) -> RepositoryResult<Vec<Hold>> {
        let conn = self.get_conn()?;
        Self::find_holds_with_conn(&conn, student_id)
    }

    /// 事务内查询限制记录
    pub fn find_holds_with_conn(
        conn: &Connection,
        student_id: &str,
    ) -> RepositoryResult<Vec<Hold>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT hold_id, student_id, hold_type, reason, is_active, created_at, cleared_at
            FROM student_hold
            WHERE student_id = ?1
            ORDER BY created_at ASC
            "#,
        )?;
        let rows = stmt.query_map(params![student_id], map_hold)?;
        let mut holds = Vec::new();
        for row in rows {
            holds.push(row?);
        }
        Ok(holds)
    }

    // ===== 选课时间票 =====

    /// 分配时间票(同一学生同一学期仅一张)
    pub fn assign_time_ticket(&self, ticket: &TimeTicket) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO time_ticket (ticket_id, student_id, term_id, priority_group, opens_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(student_id, term_id) DO UPDATE SET
                priority_group = ?4, opens_at = ?5
            "#,
            params![
                ticket.ticket_id,
                ticket.student_id,
                ticket.term_id,
                ticket.priority_group,
                ticket.opens_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// 查询学生本学期时间票
    pub fn find_time_ticket(
        &self,
        student_id: &str,
        term_id: &str,
    ) -> RepositoryResult<Option<TimeTicket>> {
        let conn = self.get_conn()?;
        Self::find_time_ticket_with_conn(&conn, student_id, term_id)
    }

    /// 事务内查询时间票
    pub fn find_time_ticket_with_conn(
        conn: &Connection,
        student_id: &str,
        term_id: &str,
    ) -> RepositoryResult<Option<TimeTicket>> {
        let ticket = conn
            .query_row(
                r#"
                SELECT ticket_id, student_id, term_id, priority_group, opens_at
                FROM time_ticket
                WHERE student_id = ?1 AND term_id = ?2
                "#,
                params![student_id, term_id],
                map_ticket,
            )
            .optional()?;
        Ok(ticket)
    }
}

// ===== 行映射 =====

fn map_student(row: &Row<'_>) -> rusqlite::Result<Student> {
    let status: String = row.get(2)?;
    Ok(Student {
        student_id: row.get(0)?,
        name: row.get(1)?,
        status: StudentStatus::from_str(&status),
        created_at: row.get(3)?,
    })
}

fn map_hold(row: &Row<'_>) -> rusqlite::Result<Hold> {
    let hold_type: String = row.get(2)?;
    let is_active: i32 = row.get(4)?;
    Ok(Hold {
        hold_id: row.get(0)?,
        student_id: row.get(1)?,
        hold_type: HoldType::from_str(&hold_type),
        reason: row.get(3)?,
        is_active: is_active != 0,
        created_at: row.get(5)?,
        cleared_at: row.get(6)?,
    })
}

fn map_ticket(row: &Row<'_>) -> rusqlite::Result<TimeTicket> {
    Ok(TimeTicket {
        ticket_id: row.get(0)?,
        student_id: row.get(1)?,
        term_id: row.get(2)?,
        priority_group: row.get(3)?,
        opens_at: row.get(4)?,
    })
}
