// ==========================================
// 高校选课系统 - 课程与教学班仓储
// ==========================================
// 依据: 选课引擎设计说明 - 数据模型
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::course::{Course, CourseSection};
use crate::domain::types::SectionStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// CourseRepository - 课程主数据仓储
// ==========================================

/// 课程仓储
/// 职责: 管理 course / course_prereq 表
pub struct CourseRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CourseRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新增课程(连同先修关系, 单事务)
    pub fn insert(&self, course: &Course) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO course (course_code, title, department, credit_hours) VALUES (?1, ?2, ?3, ?4)",
            params![
                course.course_code,
                course.title,
                course.department,
                course.credit_hours,
            ],
        )?;
        for prereq in &course.prerequisites {
            tx.execute(
                "INSERT INTO course_prereq (course_code, prereq_code) VALUES (?1, ?2)",
                params![course.course_code, prereq],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// 按课程代码查询课程(含先修集合)
    pub fn find_by_code(&self, course_code: &str) -> RepositoryResult<Option<Course>> {
        let conn = self.get_conn()?;
        Self::find_by_code_with_conn(&conn, course_code)
    }

    /// 事务内查询课程
    pub fn find_by_code_with_conn(
        conn: &Connection,
        course_code: &str,
    ) -> RepositoryResult<Option<Course>> {
        let base = conn
            .query_row(
                "SELECT course_code, title, department, credit_hours FROM course WHERE course_code = ?1",
                params![course_code],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, f64>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((code, title, department, credit_hours)) = base else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT prereq_code FROM course_prereq WHERE course_code = ?1 ORDER BY prereq_code",
        )?;
        let rows = stmt.query_map(params![code], |row| row.get::<_, String>(0))?;
        let mut prerequisites = Vec::new();
        for row in rows {
            prerequisites.push(row?);
        }

        Ok(Some(Course {
            course_code: code,
            title,
            department,
            credit_hours,
            prerequisites,
        }))
    }
}

// ==========================================
// CourseSectionRepository - 教学班仓储
// ==========================================

/// 教学班仓储
/// 职责: 管理 course_section 表的主数据与生命周期;
/// 占用计数归 EnrollmentRepository 在事务内推导, 此处不碰
pub struct CourseSectionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CourseSectionRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新增教学班
    pub fn insert(&self, section: &CourseSection) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO course_section
                (section_id, course_code, term_id, section_no, instructor,
                 capacity, waitlist_capacity, status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                section.section_id,
                section.course_code,
                section.term_id,
                section.section_no,
                section.instructor,
                section.capacity,
                section.waitlist_capacity,
                section.status.to_db_str(),
                section.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// 按 ID 查询教学班
    pub fn find_by_id(&self, section_id: &str) -> RepositoryResult<Option<CourseSection>> {
        let conn = self.get_conn()?;
        Self::find_by_id_with_conn(&conn, section_id)
    }

    /// 事务内查询教学班
    pub fn find_by_id_with_conn(
        conn: &Connection,
        section_id: &str,
    ) -> RepositoryResult<Option<CourseSection>> {
        let section = conn
            .query_row(
                r#"
                SELECT section_id, course_code, term_id, section_no, instructor,
                       capacity, waitlist_capacity, status, created_at
                FROM course_section
                WHERE section_id = ?1
                "#,
                params![section_id],
                map_section,
            )
            .optional()?;
        Ok(section)
    }

    /// 取消教学班
    pub fn cancel(&self, section_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE course_section SET status = 'CANCELLED' WHERE section_id = ?1",
            params![section_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "CourseSection".to_string(),
                id: section_id.to_string(),
            });
        }
        Ok(())
    }

    /// 调整容量(管理员操作, 不回收已占用名额)
    pub fn update_capacity(&self, section_id: &str, capacity: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE course_section SET capacity = ?1 WHERE section_id = ?2",
            params![capacity, section_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "CourseSection".to_string(),
                id: section_id.to_string(),
            });
        }
        Ok(())
    }
}

// ===== 行映射 =====

fn map_section(row: &Row<'_>) -> rusqlite::Result<CourseSection> {
    let status: String = row.get(7)?;
    Ok(CourseSection {
        section_id: row.get(0)?,
        course_code: row.get(1)?,
        term_id: row.get(2)?,
        section_no: row.get(3)?,
        instructor: row.get(4)?,
        capacity: row.get(5)?,
        waitlist_capacity: row.get(6)?,
        status: SectionStatus::from_str(&status),
        created_at: row.get(8)?,
    })
}
