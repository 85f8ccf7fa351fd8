// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、测试数据生成等功能
// 说明: 学期/时间票按"当前时间前后"生成, 保证候补晋升
//       复核(使用墙钟时间)在任何运行时刻都落在注册窗口内
// ==========================================

#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection};
use sis_registration::db;
use std::error::Error;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    sis_registration::logging::init_test();

    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = db::open_sqlite_connection(&db_path)?;
    db::init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开共享连接(测试栈的各组件共用)
pub fn open_shared(db_path: &str) -> Arc<Mutex<Connection>> {
    let conn = db::open_sqlite_connection(db_path).unwrap();
    Arc::new(Mutex::new(conn))
}

/// 注册窗口内的一个请求时刻
pub fn as_of_now() -> DateTime<Utc> {
    Utc::now()
}

// ==========================================
// 种子数据
// ==========================================

/// 写入一个对当前时刻开放注册的学期
///
/// registration_start = 30 天前, add_drop_deadline = 30 天后
pub fn seed_open_term(conn: &Connection, term_id: &str) {
    let now = Utc::now();
    let reg_start = now - Duration::days(30);
    let start = (now + Duration::days(10)).date_naive();
    let end = (now + Duration::days(120)).date_naive();
    let deadline = (now + Duration::days(30)).date_naive();

    conn.execute(
        "INSERT INTO term VALUES (?1, 2026, 'FALL', ?2, ?3, ?4, ?5)",
        params![
            term_id,
            start.format("%Y-%m-%d").to_string(),
            end.format("%Y-%m-%d").to_string(),
            deadline.format("%Y-%m-%d").to_string(),
            reg_start.to_rfc3339(),
        ],
    )
    .unwrap();
}

/// 写入一个注册已截止的学期(add_drop_deadline 在昨天之前)
pub fn seed_closed_term(conn: &Connection, term_id: &str) {
    let now = Utc::now();
    let reg_start = now - Duration::days(90);
    let deadline = (now - Duration::days(2)).date_naive();
    let start = (now - Duration::days(60)).date_naive();
    let end = (now + Duration::days(30)).date_naive();

    conn.execute(
        "INSERT INTO term VALUES (?1, 2026, 'SPRING', ?2, ?3, ?4, ?5)",
        params![
            term_id,
            start.format("%Y-%m-%d").to_string(),
            end.format("%Y-%m-%d").to_string(),
            deadline.format("%Y-%m-%d").to_string(),
            reg_start.to_rfc3339(),
        ],
    )
    .unwrap();
}

/// 写入课程(可带先修)
pub fn seed_course(conn: &Connection, code: &str, credits: f64, prereqs: &[&str]) {
    conn.execute(
        "INSERT INTO course (course_code, title, department, credit_hours) VALUES (?1, ?2, 'CS', ?3)",
        params![code, format!("课程 {}", code), credits],
    )
    .unwrap();
    for prereq in prereqs {
        conn.execute(
            "INSERT INTO course_prereq (course_code, prereq_code) VALUES (?1, ?2)",
            params![code, prereq],
        )
        .unwrap();
    }
}

/// 写入带院系/教师的课程(查询过滤测试用)
pub fn seed_course_in_department(conn: &Connection, code: &str, credits: f64, department: &str) {
    conn.execute(
        "INSERT INTO course (course_code, title, department, credit_hours) VALUES (?1, ?2, ?3, ?4)",
        params![code, format!("课程 {}", code), department, credits],
    )
    .unwrap();
}

/// 写入教学班
pub fn seed_section(
    conn: &Connection,
    section_id: &str,
    course_code: &str,
    term_id: &str,
    capacity: i64,
    waitlist_capacity: i64,
) {
    seed_section_with_instructor(
        conn,
        section_id,
        course_code,
        term_id,
        capacity,
        waitlist_capacity,
        "王老师",
    );
}

/// 写入教学班(指定教师)
pub fn seed_section_with_instructor(
    conn: &Connection,
    section_id: &str,
    course_code: &str,
    term_id: &str,
    capacity: i64,
    waitlist_capacity: i64,
    instructor: &str,
) {
    conn.execute(
        r#"
        INSERT INTO course_section
            (section_id, course_code, term_id, section_no, instructor,
             capacity, waitlist_capacity)
        VALUES (?1, ?2, ?3, '01', ?4, ?5, ?6)
        "#,
        params![
            section_id,
            course_code,
            term_id,
            instructor,
            capacity,
            waitlist_capacity
        ],
    )
    .unwrap();
}

/// 写入在读学生 + 已开放的时间票
pub fn seed_student_with_ticket(conn: &Connection, student_id: &str, term_id: &str) {
    seed_student(conn, student_id, "ACTIVE");
    seed_ticket(conn, student_id, term_id, Utc::now() - Duration::days(7));
}

/// 写入学生
pub fn seed_student(conn: &Connection, student_id: &str, status: &str) {
    conn.execute(
        "INSERT INTO student (student_id, name, status) VALUES (?1, ?2, ?3)",
        params![student_id, format!("学生{}", student_id), status],
    )
    .unwrap();
}

/// 分配时间票
pub fn seed_ticket(conn: &Connection, student_id: &str, term_id: &str, opens_at: DateTime<Utc>) {
    conn.execute(
        "INSERT INTO time_ticket (ticket_id, student_id, term_id, priority_group, opens_at)
         VALUES (?1, ?2, ?3, 'JUNIOR', ?4)",
        params![
            format!("TK-{}-{}", student_id, term_id),
            student_id,
            term_id,
            opens_at.to_rfc3339(),
        ],
    )
    .unwrap();
}

/// 设置激活限制
pub fn seed_hold(conn: &Connection, hold_id: &str, student_id: &str, hold_type: &str) {
    conn.execute(
        "INSERT INTO student_hold (hold_id, student_id, hold_type, reason)
         VALUES (?1, ?2, ?3, ?4)",
        params![hold_id, student_id, hold_type, format!("{} 限制", hold_type)],
    )
    .unwrap();
}

/// 登记历史成绩
pub fn seed_record(conn: &Connection, student_id: &str, course_code: &str, grade: &str) {
    conn.execute(
        "INSERT INTO academic_record
            (record_id, student_id, course_code, term_id, grade, completed_on)
         VALUES (?1, ?2, ?3, '2026-SPRING', ?4, '2026-06-30')",
        params![
            format!("R-{}-{}", student_id, course_code),
            student_id,
            course_code,
            grade
        ],
    )
    .unwrap();
}
