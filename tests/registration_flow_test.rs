// ==========================================
// 选课主流程集成测试
// ==========================================
// 职责: 验证规则目录次序、容量路由与历史留痕
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

use chrono::{Duration, Utc};
use sis_registration::api::{ApiError, RegistrationApi};
use sis_registration::domain::types::EnrollmentStatus;
use sis_registration::engine::Violation;
use test_helpers::*;

/// 构建一个标准测试环境: 开放学期 + 一门 3 学分课程 + 容量 2 的教学班
fn setup() -> (tempfile::NamedTempFile, RegistrationApi) {
    let (temp_file, db_path) = create_test_db().unwrap();
    let conn = open_shared(&db_path);

    {
        let c = conn.lock().unwrap();
        seed_open_term(&c, "2026-FALL");
        seed_course(&c, "CS101", 3.0, &[]);
        seed_section(&c, "CS101-01", "CS101", "2026-FALL", 2, 3);
        seed_student_with_ticket(&c, "S001", "2026-FALL");
        seed_student_with_ticket(&c, "S002", "2026-FALL");
        seed_student_with_ticket(&c, "S003", "2026-FALL");
    }

    (temp_file, RegistrationApi::with_default_stack(conn))
}

#[test]
fn test_register_with_free_capacity_enrolls() {
    let (_db, api) = setup();

    let enrollment = api.register("S001", "CS101-01", as_of_now()).unwrap();
    assert_eq!(enrollment.status, EnrollmentStatus::Enrolled);
    assert!(enrollment.position.is_none());

    let occ = api.section_occupancy("CS101-01").unwrap();
    assert_eq!(occ.enrolled_count, 1);
    assert_eq!(occ.waitlisted_count, 0);
}

#[test]
fn test_register_full_section_waitlists_fifo() {
    let (_db, api) = setup();

    api.register("S001", "CS101-01", as_of_now()).unwrap();
    api.register("S002", "CS101-01", as_of_now()).unwrap();

    // 容量 2 已满, 第三人进候补且序号为 1
    let third = api.register("S003", "CS101-01", as_of_now()).unwrap();
    assert_eq!(third.status, EnrollmentStatus::Waitlisted);
    assert_eq!(third.position, Some(1));

    let occ = api.section_occupancy("CS101-01").unwrap();
    assert_eq!(occ.enrolled_count, 2);
    assert_eq!(occ.waitlisted_count, 1);
}

#[test]
fn test_duplicate_enrollment_rejected_not_deduplicated() {
    let (_db, api) = setup();

    api.register("S001", "CS101-01", as_of_now()).unwrap();
    let err = api.register("S001", "CS101-01", as_of_now()).unwrap_err();

    assert_eq!(err.error_code(), "DUPLICATE_ENROLLMENT");
    // 记录数不变
    let occ = api.section_occupancy("CS101-01").unwrap();
    assert_eq!(occ.enrolled_count, 1);
}

#[test]
fn test_hold_rejection_carries_all_active_holds() {
    let (temp_file, db_path) = create_test_db().unwrap();
    let conn = open_shared(&db_path);
    {
        let c = conn.lock().unwrap();
        seed_open_term(&c, "2026-FALL");
        seed_course(&c, "CS101", 3.0, &[]);
        seed_section(&c, "CS101-01", "CS101", "2026-FALL", 30, 10);
        seed_student_with_ticket(&c, "S001", "2026-FALL");
        seed_hold(&c, "H1", "S001", "FINANCIAL");
        seed_hold(&c, "H2", "S001", "ACADEMIC");
    }
    let api = RegistrationApi::with_default_stack(conn);
    let _keep = temp_file;

    let err = api.register("S001", "CS101-01", as_of_now()).unwrap_err();
    assert_eq!(err.error_code(), "REGISTRATION_HOLD");
    match err {
        ApiError::RegistrationRejected(Violation::RegistrationHold { holds }) => {
            // 两条激活限制一次性返回
            assert_eq!(holds.len(), 2);
        }
        other => panic!("expected RegistrationHold, got {:?}", other),
    }
}

#[test]
fn test_time_ticket_not_open_exposes_opens_at() {
    let (temp_file, db_path) = create_test_db().unwrap();
    let conn = open_shared(&db_path);
    let opens_at = Utc::now() + Duration::days(3);
    {
        let c = conn.lock().unwrap();
        seed_open_term(&c, "2026-FALL");
        seed_course(&c, "CS101", 3.0, &[]);
        seed_section(&c, "CS101-01", "CS101", "2026-FALL", 30, 10);
        seed_student(&c, "S001", "ACTIVE");
        seed_ticket(&c, "S001", "2026-FALL", opens_at);
    }
    let api = RegistrationApi::with_default_stack(conn);
    let _keep = temp_file;

    let err = api.register("S001", "CS101-01", Utc::now()).unwrap_err();
    assert_eq!(err.error_code(), "REGISTRATION_NOT_OPEN");
    match err {
        ApiError::RegistrationRejected(Violation::RegistrationNotOpen { opens_at: reported }) => {
            assert_eq!(reported, opens_at);
        }
        other => panic!("expected RegistrationNotOpen, got {:?}", other),
    }
}

#[test]
fn test_inactive_student_rejected_first() {
    let (temp_file, db_path) = create_test_db().unwrap();
    let conn = open_shared(&db_path);
    {
        let c = conn.lock().unwrap();
        seed_open_term(&c, "2026-FALL");
        seed_course(&c, "CS101", 3.0, &[]);
        seed_section(&c, "CS101-01", "CS101", "2026-FALL", 30, 10);
        seed_student(&c, "S001", "UNVERIFIED");
        // 同时挂一条限制: 账户状态规则在先, 必须报 STUDENT_NOT_ACTIVE
        seed_hold(&c, "H1", "S001", "FINANCIAL");
    }
    let api = RegistrationApi::with_default_stack(conn);
    let _keep = temp_file;

    let err = api.register("S001", "CS101-01", as_of_now()).unwrap_err();
    assert_eq!(err.error_code(), "STUDENT_NOT_ACTIVE");
}

#[test]
fn test_cancelled_section_unavailable() {
    let (temp_file, db_path) = create_test_db().unwrap();
    let conn = open_shared(&db_path);
    {
        let c = conn.lock().unwrap();
        seed_open_term(&c, "2026-FALL");
        seed_course(&c, "CS101", 3.0, &[]);
        seed_section(&c, "CS101-01", "CS101", "2026-FALL", 30, 10);
        c.execute(
            "UPDATE course_section SET status = 'CANCELLED' WHERE section_id = 'CS101-01'",
            [],
        )
        .unwrap();
        seed_student_with_ticket(&c, "S001", "2026-FALL");
    }
    let api = RegistrationApi::with_default_stack(conn);
    let _keep = temp_file;

    let err = api.register("S001", "CS101-01", as_of_now()).unwrap_err();
    assert_eq!(err.error_code(), "COURSE_SECTION_UNAVAILABLE");
}

#[test]
fn test_closed_term_unavailable() {
    let (temp_file, db_path) = create_test_db().unwrap();
    let conn = open_shared(&db_path);
    {
        let c = conn.lock().unwrap();
        seed_closed_term(&c, "2026-SPRING");
        seed_course(&c, "CS101", 3.0, &[]);
        seed_section(&c, "CS101-01", "CS101", "2026-SPRING", 30, 10);
        seed_student_with_ticket(&c, "S001", "2026-SPRING");
    }
    let api = RegistrationApi::with_default_stack(conn);
    let _keep = temp_file;

    let err = api.register("S001", "CS101-01", Utc::now()).unwrap_err();
    assert_eq!(err.error_code(), "COURSE_SECTION_UNAVAILABLE");
}

#[test]
fn test_repeat_course_rule_scenario() {
    let (temp_file, db_path) = create_test_db().unwrap();
    let conn = open_shared(&db_path);
    {
        let c = conn.lock().unwrap();
        seed_open_term(&c, "2026-FALL");
        seed_course(&c, "CS101", 3.0, &[]);
        seed_section(&c, "CS101-01", "CS101", "2026-FALL", 30, 10);
        seed_student_with_ticket(&c, "S001", "2026-FALL");
        seed_student_with_ticket(&c, "S002", "2026-FALL");
        seed_record(&c, "S001", "CS101", "F"); // 挂科可重修
        seed_record(&c, "S002", "CS101", "C"); // 已及格不可重修
    }
    let api = RegistrationApi::with_default_stack(conn);
    let _keep = temp_file;

    let enrolled = api.register("S001", "CS101-01", as_of_now()).unwrap();
    assert_eq!(enrolled.status, EnrollmentStatus::Enrolled);

    let err = api.register("S002", "CS101-01", as_of_now()).unwrap_err();
    assert_eq!(err.error_code(), "REPEAT_COURSE");
    match err {
        ApiError::RegistrationRejected(Violation::RepeatCourse {
            course_code,
            existing_grade,
        }) => {
            assert_eq!(course_code, "CS101");
            assert_eq!(existing_grade, "C");
        }
        other => panic!("expected RepeatCourse, got {:?}", other),
    }
}

#[test]
fn test_prerequisite_rule() {
    let (temp_file, db_path) = create_test_db().unwrap();
    let conn = open_shared(&db_path);
    {
        let c = conn.lock().unwrap();
        seed_open_term(&c, "2026-FALL");
        seed_course(&c, "CS101", 3.0, &[]);
        seed_course(&c, "CS201", 4.0, &["CS101"]);
        seed_section(&c, "CS201-01", "CS201", "2026-FALL", 30, 10);
        seed_student_with_ticket(&c, "S001", "2026-FALL");
        seed_student_with_ticket(&c, "S002", "2026-FALL");
        seed_record(&c, "S001", "CS101", "B");
        // S002 无 CS101 成绩
    }
    let api = RegistrationApi::with_default_stack(conn);
    let _keep = temp_file;

    assert!(api.register("S001", "CS201-01", as_of_now()).is_ok());

    let err = api.register("S002", "CS201-01", as_of_now()).unwrap_err();
    assert_eq!(err.error_code(), "PREREQUISITE_NOT_MET");
}

#[test]
fn test_credit_limit_boundary() {
    let (temp_file, db_path) = create_test_db().unwrap();
    let conn = open_shared(&db_path);
    {
        let c = conn.lock().unwrap();
        seed_open_term(&c, "2026-FALL");
        // 已选 15 学分: 3 门 5 学分课
        for code in ["MA101", "MA102", "MA103"] {
            seed_course(&c, code, 5.0, &[]);
            seed_section(&c, &format!("{}-01", code), code, "2026-FALL", 30, 10);
        }
        seed_course(&c, "CS401", 4.0, &[]);
        seed_section(&c, "CS401-01", "CS401", "2026-FALL", 30, 10);
        seed_course(&c, "CS301", 3.0, &[]);
        seed_section(&c, "CS301-01", "CS301", "2026-FALL", 30, 10);
        seed_student_with_ticket(&c, "S001", "2026-FALL");
    }
    let api = RegistrationApi::with_default_stack(conn);
    let _keep = temp_file;

    for code in ["MA101", "MA102", "MA103"] {
        api.register("S001", &format!("{}-01", code), as_of_now())
            .unwrap();
    }

    // 15 + 4 > 18 拒绝, 违规值携带三元组
    let err = api.register("S001", "CS401-01", as_of_now()).unwrap_err();
    assert_eq!(err.error_code(), "CREDIT_LIMIT_EXCEEDED");
    match err {
        ApiError::RegistrationRejected(Violation::CreditLimitExceeded {
            current,
            attempted,
            max,
        }) => {
            assert_eq!(current, 15.0);
            assert_eq!(attempted, 4.0);
            assert_eq!(max, 18.0);
        }
        other => panic!("expected CreditLimitExceeded, got {:?}", other),
    }

    // 15 + 3 = 18 通过
    assert!(api.register("S001", "CS301-01", as_of_now()).is_ok());
}

#[test]
fn test_waitlist_full_rejects_with_capacity_code() {
    let (temp_file, db_path) = create_test_db().unwrap();
    let conn = open_shared(&db_path);
    {
        let c = conn.lock().unwrap();
        seed_open_term(&c, "2026-FALL");
        seed_course(&c, "CS101", 3.0, &[]);
        // 容量 1 + 候补 1
        seed_section(&c, "CS101-01", "CS101", "2026-FALL", 1, 1);
        for s in ["S001", "S002", "S003"] {
            seed_student_with_ticket(&c, s, "2026-FALL");
        }
    }
    let api = RegistrationApi::with_default_stack(conn);
    let _keep = temp_file;

    api.register("S001", "CS101-01", as_of_now()).unwrap();
    let second = api.register("S002", "CS101-01", as_of_now()).unwrap();
    assert_eq!(second.status, EnrollmentStatus::Waitlisted);

    let err = api.register("S003", "CS101-01", as_of_now()).unwrap_err();
    assert_eq!(err.error_code(), "ENROLLMENT_CAPACITY_EXCEEDED");
}

#[test]
fn test_rejected_registration_leaves_no_rows() {
    let (_db, api) = setup();

    // S001 未到时间票窗口之外的条件: 用重复选课触发拒绝
    api.register("S001", "CS101-01", as_of_now()).unwrap();
    let _ = api.register("S001", "CS101-01", as_of_now()).unwrap_err();

    // 历史里只有一次 REGISTERED, 没有半截记录
    let history = api.enrollment_history("S001", "CS101-01").unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].reason, "REGISTERED");
}

#[test]
fn test_withdraw_and_state_machine_guard() {
    let (_db, api) = setup();

    let enrollment = api.register("S001", "CS101-01", as_of_now()).unwrap();
    let dropped = api.withdraw(&enrollment.enrollment_id, "S001").unwrap();
    assert_eq!(dropped.status, EnrollmentStatus::Dropped);
    assert_eq!(dropped.drop_reason.as_deref(), Some("WITHDRAWN"));

    // 终态记录不允许再次退选
    let err = api.withdraw(&enrollment.enrollment_id, "S001").unwrap_err();
    assert_eq!(err.error_code(), "INVALID_STATE_TRANSITION");

    // 名额已释放
    let occ = api.section_occupancy("CS101-01").unwrap();
    assert_eq!(occ.enrolled_count, 0);

    // 历史可回放: REGISTERED -> WITHDRAWN
    let history = api.enrollment_history("S001", "CS101-01").unwrap();
    let reasons: Vec<&str> = history.iter().map(|h| h.reason.as_str()).collect();
    assert_eq!(reasons, vec!["REGISTERED", "WITHDRAWN"]);
}

#[test]
fn test_close_term_completes_enrollments() {
    let (_db, api) = setup();

    api.register("S001", "CS101-01", as_of_now()).unwrap();
    api.register("S002", "CS101-01", as_of_now()).unwrap();

    let completed = api.close_term("2026-FALL").unwrap();
    assert_eq!(completed, 2);

    let occ = api.section_occupancy("CS101-01").unwrap();
    assert_eq!(occ.enrolled_count, 0);

    // 结课后的记录是终态, 不再阻断重新选课(查重只看非终态)
    let again = api.register("S001", "CS101-01", as_of_now()).unwrap();
    assert_eq!(again.status, EnrollmentStatus::Enrolled);
}
