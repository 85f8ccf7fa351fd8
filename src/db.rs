// ==========================================
// 高校选课系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免"部分模块外键开启/部分不开启"
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 集中建表语句，测试与种子程序共用同一份 schema
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::path::PathBuf;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
///
/// 说明：版本号用于提示/告警（不做自动迁移），避免静默在旧库上运行。
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 默认数据库路径（用户数据目录下）
pub fn default_db_path() -> String {
    let mut path: PathBuf = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("sis-registration");
    let _ = std::fs::create_dir_all(&path);
    path.push("registration.db");
    path.to_string_lossy().to_string()
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 初始化全量 schema（幂等）
///
/// # 说明
/// - 生产库与测试库共用此建表语句
/// - enrollment 上的部分唯一索引是查重不变量的数据库级兜底:
///   同一 (student_id, section_id) 至多一条非终态记录
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL DEFAULT 'global',
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS student (
            student_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'ACTIVE',
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS student_hold (
            hold_id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL REFERENCES student(student_id),
            hold_type TEXT NOT NULL,
            reason TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            cleared_at TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_hold_student_active
          ON student_hold(student_id, is_active);

        CREATE TABLE IF NOT EXISTS term (
            term_id TEXT PRIMARY KEY,
            academic_year INTEGER NOT NULL,
            semester TEXT NOT NULL,
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            add_drop_deadline TEXT NOT NULL,
            registration_start TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS time_ticket (
            ticket_id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL REFERENCES student(student_id),
            term_id TEXT NOT NULL REFERENCES term(term_id),
            priority_group TEXT NOT NULL,
            opens_at TEXT NOT NULL,
            UNIQUE (student_id, term_id)
        );

        CREATE TABLE IF NOT EXISTS course (
            course_code TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            department TEXT NOT NULL,
            credit_hours REAL NOT NULL
        );

        CREATE TABLE IF NOT EXISTS course_prereq (
            course_code TEXT NOT NULL REFERENCES course(course_code),
            prereq_code TEXT NOT NULL REFERENCES course(course_code),
            PRIMARY KEY (course_code, prereq_code)
        );

        CREATE TABLE IF NOT EXISTS course_section (
            section_id TEXT PRIMARY KEY,
            course_code TEXT NOT NULL REFERENCES course(course_code),
            term_id TEXT NOT NULL REFERENCES term(term_id),
            section_no TEXT NOT NULL,
            instructor TEXT NOT NULL,
            capacity INTEGER NOT NULL CHECK (capacity >= 0),
            waitlist_capacity INTEGER NOT NULL DEFAULT 10 CHECK (waitlist_capacity >= 0),
            status TEXT NOT NULL DEFAULT 'OPEN',
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_section_term
          ON course_section(term_id, status);

        CREATE TABLE IF NOT EXISTS enrollment (
            enrollment_id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL REFERENCES student(student_id),
            section_id TEXT NOT NULL REFERENCES course_section(section_id),
            status TEXT NOT NULL,
            position INTEGER,
            drop_reason TEXT,
            created_at TEXT NOT NULL,
            status_changed_at TEXT NOT NULL
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_enrollment_live_pair
          ON enrollment(student_id, section_id)
          WHERE status IN ('ENROLLED', 'WAITLISTED');

        CREATE INDEX IF NOT EXISTS idx_enrollment_section_status
          ON enrollment(section_id, status, position);

        CREATE INDEX IF NOT EXISTS idx_enrollment_student
          ON enrollment(student_id, status);

        CREATE TABLE IF NOT EXISTS academic_record (
            record_id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL REFERENCES student(student_id),
            course_code TEXT NOT NULL,
            term_id TEXT NOT NULL,
            grade TEXT NOT NULL,
            completed_on TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_record_student_course
          ON academic_record(student_id, course_code);

        CREATE TABLE IF NOT EXISTS enrollment_history (
            history_id TEXT PRIMARY KEY,
            enrollment_id TEXT NOT NULL,
            student_id TEXT NOT NULL,
            section_id TEXT NOT NULL,
            from_status TEXT,
            to_status TEXT NOT NULL,
            reason TEXT NOT NULL,
            detail TEXT,
            actor TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_history_enrollment
          ON enrollment_history(enrollment_id, created_at);

        CREATE TABLE IF NOT EXISTS promotion_queue (
            task_id TEXT PRIMARY KEY,
            section_id TEXT NOT NULL,
            trigger_type TEXT NOT NULL,
            trigger_source TEXT,
            status TEXT NOT NULL DEFAULT 'PENDING',
            retry_count INTEGER NOT NULL DEFAULT 0,
            max_retries INTEGER NOT NULL DEFAULT 3,
            promoted_count INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            started_at TEXT,
            completed_at TEXT,
            error_message TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_promotion_queue_status
          ON promotion_queue(status, created_at);

        CREATE INDEX IF NOT EXISTS idx_promotion_queue_section
          ON promotion_queue(section_id, status);

        INSERT OR IGNORE INTO schema_version (version) VALUES (1);
        "#,
    )?;
    Ok(())
}
