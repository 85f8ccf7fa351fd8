// ==========================================
// 高校选课系统 - 学期仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::term::Term;
use crate::domain::types::Semester;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

/// 学期仓储
pub struct TermRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TermRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新增学期
    pub fn insert(&self, term: &Term) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO term
                (term_id, academic_year, semester, start_date, end_date,
                 add_drop_deadline, registration_start)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                term.term_id,
                term.academic_year,
                term.semester.to_db_str(),
                term.start_date.format("%Y-%m-%d").to_string(),
                term.end_date.format("%Y-%m-%d").to_string(),
                term.add_drop_deadline.format("%Y-%m-%d").to_string(),
                term.registration_start.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// 按 ID 查询学期
    pub fn find_by_id(&self, term_id: &str) -> RepositoryResult<Option<Term>> {
        let conn = self.get_conn()?;
        Self::find_by_id_with_conn(&conn, term_id)
    }

    /// 事务内查询学期
    pub fn find_by_id_with_conn(
        conn: &Connection,
        term_id: &str,
    ) -> RepositoryResult<Option<Term>> {
        let term = conn
            .query_row(
                r#"
                SELECT term_id, academic_year, semester, start_date, end_date,
                       add_drop_deadline, registration_start
                FROM term
                WHERE term_id = ?1
                "#,
                params![term_id],
                map_term,
            )
            .optional()?;
        Ok(term)
    }
}

// ===== 行映射 =====

fn parse_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .unwrap_or_else(|_| NaiveDate::from_ymd_opt(1970, 1, 1).unwrap())
}

fn map_term(row: &Row<'_>) -> rusqlite::Result<Term> {
    let semester: String = row.get(2)?;
    let start: String = row.get(3)?;
    let end: String = row.get(4)?;
    let deadline: String = row.get(5)?;
    Ok(Term {
        term_id: row.get(0)?,
        academic_year: row.get(1)?,
        semester: Semester::from_str(&semester),
        start_date: parse_date(&start),
        end_date: parse_date(&end),
        add_drop_deadline: parse_date(&deadline),
        registration_start: row.get(6)?,
    })
}
