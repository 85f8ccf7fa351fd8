// ==========================================
// 高校选课系统 - 选课查询过滤器
// ==========================================
// 职责: 报表侧的组合条件查询, 不含任何业务规则
// 约束: 全部条件参数化, 防止 SQL 注入
// ==========================================

use crate::domain::types::EnrollmentStatus;
use crate::repository::enrollment_repo::map_enrollment;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::domain::Enrollment;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// EnrollmentQueryFilter - 组合过滤条件
// ==========================================

/// 选课查询过滤条件
///
/// 所有维度可自由组合; 未设置的维度不参与过滤。
#[derive(Debug, Clone, Default)]
pub struct EnrollmentQueryFilter {
    pub student_id: Option<String>,
    pub section_id: Option<String>,
    pub course_code: Option<String>,
    pub term_id: Option<String>,
    pub department: Option<String>,
    pub instructor: Option<String>,
    pub status: Option<EnrollmentStatus>,
    pub limit: Option<usize>,
}

impl EnrollmentQueryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_student(mut self, student_id: &str) -> Self {
        self.student_id = Some(student_id.to_string());
        self
    }

    pub fn by_section(mut self, section_id: &str) -> Self {
        self.section_id = Some(section_id.to_string());
        self
    }

    pub fn by_course(mut self, course_code: &str) -> Self {
        self.course_code = Some(course_code.to_string());
        self
    }

    pub fn by_term(mut self, term_id: &str) -> Self {
        self.term_id = Some(term_id.to_string());
        self
    }

    pub fn by_department(mut self, department: &str) -> Self {
        self.department = Some(department.to_string());
        self
    }

    pub fn by_instructor(mut self, instructor: &str) -> Self {
        self.instructor = Some(instructor.to_string());
        self
    }

    pub fn by_status(mut self, status: EnrollmentStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// 构建 WHERE 子句与参数列表
    ///
    /// # 返回
    /// - (where_sql, params): where_sql 不带 "WHERE" 前缀, 条件用 AND 连接;
    ///   无任何条件时返回 "1=1"
    fn build_where(&self) -> (String, Vec<Value>) {
        let mut clauses: Vec<&str> = Vec::new();
        let mut params: Vec<Value> = Vec::new();

        if let Some(v) = &self.student_id {
            clauses.push("e.student_id = ?");
            params.push(Value::Text(v.clone()));
        }
        if let Some(v) = &self.section_id {
            clauses.push("e.section_id = ?");
            params.push(Value::Text(v.clone()));
        }
        if let Some(v) = &self.course_code {
            clauses.push("s.course_code = ?");
            params.push(Value::Text(v.clone()));
        }
        if let Some(v) = &self.term_id {
            clauses.push("s.term_id = ?");
            params.push(Value::Text(v.clone()));
        }
        if let Some(v) = &self.department {
            clauses.push("c.department = ?");
            params.push(Value::Text(v.clone()));
        }
        if let Some(v) = &self.instructor {
            clauses.push("s.instructor = ?");
            params.push(Value::Text(v.clone()));
        }
        if let Some(v) = &self.status {
            clauses.push("e.status = ?");
            params.push(Value::Text(v.to_db_str().to_string()));
        }

        if clauses.is_empty() {
            ("1=1".to_string(), params)
        } else {
            (clauses.join(" AND "), params)
        }
    }
}

// ==========================================
// EnrollmentView - 报表行
// ==========================================

/// 报表查询结果行(选课记录 + 课程/教学班维度)
#[derive(Debug, Clone)]
pub struct EnrollmentView {
    pub enrollment: Enrollment,
    pub course_code: String,
    pub course_title: String,
    pub department: String,
    pub instructor: String,
    pub term_id: String,
}

// ==========================================
// EnrollmentQueryRepository - 查询仓储
// ==========================================

/// 选课查询仓储(只读)
pub struct EnrollmentQueryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl EnrollmentQueryRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按组合条件查询选课记录
    ///
    /// 排序: 教学班、状态、候补序号、创建时间, 保证结果稳定可比对
    pub fn query(&self, filter: &EnrollmentQueryFilter) -> RepositoryResult<Vec<EnrollmentView>> {
        let conn = self.get_conn()?;
        let (where_sql, params) = filter.build_where();

        let mut sql = format!(
            r#"
            SELECT e.enrollment_id, e.student_id, e.section_id, e.status,
                   e.position, e.drop_reason, e.created_at, e.status_changed_at,
                   s.course_code, c.title, c.department, s.instructor, s.term_id
            FROM enrollment e
            JOIN course_section s ON e.section_id = s.section_id
            JOIN course c ON s.course_code = c.course_code
            WHERE {}
            ORDER BY e.section_id, e.status, e.position, e.created_at
            "#,
            where_sql
        );
        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params.into_iter()), map_view)?;
        let mut views = Vec::new();
        for row in rows {
            views.push(row?);
        }
        Ok(views)
    }

    /// 按组合条件统计记录数
    pub fn count(&self, filter: &EnrollmentQueryFilter) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let (where_sql, params) = filter.build_where();

        let sql = format!(
            r#"
            SELECT COUNT(*)
            FROM enrollment e
            JOIN course_section s ON e.section_id = s.section_id
            JOIN course c ON s.course_code = c.course_code
            WHERE {}
            "#,
            where_sql
        );

        let count: i64 =
            conn.query_row(&sql, params_from_iter(params.into_iter()), |row| row.get(0))?;
        Ok(count)
    }
}

// ===== 行映射 =====

fn map_view(row: &Row<'_>) -> rusqlite::Result<EnrollmentView> {
    Ok(EnrollmentView {
        enrollment: map_enrollment(row)?,
        course_code: row.get(8)?,
        course_title: row.get(9)?,
        department: row.get(10)?,
        instructor: row.get(11)?,
        term_id: row.get(12)?,
    })
}
