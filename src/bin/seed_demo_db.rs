// Dev utility: reset a database file and seed a small registration scenario.
//
// Usage:
//   cargo run --bin seed-demo-db -- [db_path]
//
// Seeds one term, two courses (CS101 -> CS201 prerequisite chain), three
// sections and a handful of students with tickets, holds and grades, so the
// sweep-waitlists binary and manual API calls have something to chew on.

use chrono::{NaiveDate, TimeZone, Utc};
use std::error::Error;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use sis_registration::db::{default_db_path, init_schema, open_sqlite_connection};
use sis_registration::domain::types::{HoldType, SectionStatus, Semester, StudentStatus};
use sis_registration::domain::{
    AcademicRecord, Course, CourseSection, Hold, Student, Term, TimeTicket,
};
use sis_registration::repository::{
    AcademicRecordRepository, CourseRepository, CourseSectionRepository, StudentRepository,
    TermRepository,
};

fn main() -> Result<(), Box<dyn Error>> {
    sis_registration::logging::init();

    let db_path = std::env::args().nth(1).unwrap_or_else(default_db_path);
    if Path::new(&db_path).exists() {
        fs::remove_file(&db_path)?;
        tracing::info!("已删除旧数据库: {}", db_path);
    }

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;
    let conn = Arc::new(Mutex::new(conn));

    let term_repo = TermRepository::from_connection(conn.clone());
    let course_repo = CourseRepository::from_connection(conn.clone());
    let section_repo = CourseSectionRepository::from_connection(conn.clone());
    let student_repo = StudentRepository::from_connection(conn.clone());
    let record_repo = AcademicRecordRepository::from_connection(conn);

    // 学期
    term_repo.insert(&Term {
        term_id: "2026-FALL".to_string(),
        academic_year: 2026,
        semester: Semester::Fall,
        start_date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2026, 12, 20).unwrap(),
        add_drop_deadline: NaiveDate::from_ymd_opt(2026, 9, 12).unwrap(),
        registration_start: Utc.with_ymd_and_hms(2026, 8, 15, 0, 0, 0).unwrap(),
    })?;

    // 课程与先修链: CS101 -> CS201
    course_repo.insert(&Course {
        course_code: "CS101".to_string(),
        title: "程序设计基础".to_string(),
        department: "CS".to_string(),
        credit_hours: 3.0,
        prerequisites: vec![],
    })?;
    course_repo.insert(&Course {
        course_code: "CS201".to_string(),
        title: "数据结构".to_string(),
        department: "CS".to_string(),
        credit_hours: 4.0,
        prerequisites: vec!["CS101".to_string()],
    })?;
    course_repo.insert(&Course {
        course_code: "MA101".to_string(),
        title: "高等数学".to_string(),
        department: "MATH".to_string(),
        credit_hours: 5.0,
        prerequisites: vec![],
    })?;

    // 教学班: CS101-02 容量 1, 便于演示候补晋升
    let sections = [
        ("CS101-01", "CS101", "01", "王老师", 30, 10),
        ("CS101-02", "CS101", "02", "李老师", 1, 5),
        ("CS201-01", "CS201", "01", "赵老师", 25, 10),
    ];
    for (section_id, course_code, section_no, instructor, capacity, waitlist) in sections {
        section_repo.insert(&CourseSection {
            section_id: section_id.to_string(),
            course_code: course_code.to_string(),
            term_id: "2026-FALL".to_string(),
            section_no: section_no.to_string(),
            instructor: instructor.to_string(),
            capacity,
            waitlist_capacity: waitlist,
            status: SectionStatus::Open,
            created_at: Utc::now(),
        })?;
    }

    // 学生与时间票
    let students = [
        ("S001", "张三", StudentStatus::Active),
        ("S002", "李四", StudentStatus::Active),
        ("S003", "王五", StudentStatus::Active),
        ("S004", "陈六", StudentStatus::Unverified),
    ];
    let opens_at = Utc.with_ymd_and_hms(2026, 8, 20, 8, 0, 0).unwrap();
    for (id, name, status) in students {
        student_repo.insert(&Student::new(id.to_string(), name.to_string(), status))?;
        student_repo.assign_time_ticket(&TimeTicket {
            ticket_id: Uuid::new_v4().to_string(),
            student_id: id.to_string(),
            term_id: "2026-FALL".to_string(),
            priority_group: "JUNIOR".to_string(),
            opens_at,
        })?;
    }

    // S003 有一条未解除的财务限制
    student_repo.add_hold(&Hold {
        hold_id: "H001".to_string(),
        student_id: "S003".to_string(),
        hold_type: HoldType::Financial,
        reason: "学费未缴清".to_string(),
        is_active: true,
        created_at: Utc::now(),
        cleared_at: None,
    })?;

    // 历史成绩: S001 已通过 CS101(可选 CS201), S002 挂过 CS101(可重修)
    let completed_on = NaiveDate::from_ymd_opt(2026, 6, 30).unwrap();
    record_repo.insert(&AcademicRecord {
        record_id: "R001".to_string(),
        student_id: "S001".to_string(),
        course_code: "CS101".to_string(),
        term_id: "2026-SPRING".to_string(),
        grade: "B+".to_string(),
        completed_on,
    })?;
    record_repo.insert(&AcademicRecord {
        record_id: "R002".to_string(),
        student_id: "S002".to_string(),
        course_code: "CS101".to_string(),
        term_id: "2026-SPRING".to_string(),
        grade: "F".to_string(),
        completed_on,
    })?;

    tracing::info!("种子数据写入完成: {}", db_path);
    println!("seeded db at {}", db_path);
    Ok(())
}
