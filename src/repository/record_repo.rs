// ==========================================
// 高校选课系统 - 历史成绩仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::academic_record::AcademicRecord;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

/// 历史成绩仓储
/// 职责: 管理 academic_record 表, 供重修/先修规则取数
pub struct AcademicRecordRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AcademicRecordRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 登记成绩
    pub fn insert(&self, record: &AcademicRecord) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO academic_record
                (record_id, student_id, course_code, term_id, grade, completed_on)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                record.record_id,
                record.student_id,
                record.course_code,
                record.term_id,
                record.grade,
                record.completed_on.format("%Y-%m-%d").to_string(),
            ],
        )?;
        Ok(())
    }

    /// 查询学生全部历史成绩
    pub fn find_by_student(&self, student_id: &str) -> RepositoryResult<Vec<AcademicRecord>> {
        let conn = self.get_conn()?;
        Self::find_by_student_with_conn(&conn, student_id)
    }

    /// 事务内查询历史成绩
    pub fn find_by_student_with_conn(
        conn: &Connection,
        student_id: &str,
    ) -> RepositoryResult<Vec<AcademicRecord>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT record_id, student_id, course_code, term_id, grade, completed_on
            FROM academic_record
            WHERE student_id = ?1
            ORDER BY completed_on ASC
            "#,
        )?;
        let rows = stmt.query_map(params![student_id], map_record)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }
}

// ===== 行映射 =====

fn map_record(row: &Row<'_>) -> rusqlite::Result<AcademicRecord> {
    let completed: String = row.get(5)?;
    Ok(AcademicRecord {
        record_id: row.get(0)?,
        student_id: row.get(1)?,
        course_code: row.get(2)?,
        term_id: row.get(3)?,
        grade: row.get(4)?,
        completed_on: NaiveDate::parse_from_str(&completed, "%Y-%m-%d")
            .unwrap_or_else(|_| NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()),
    })
}
