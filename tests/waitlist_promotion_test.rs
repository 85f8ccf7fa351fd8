// ==========================================
// 候补晋升集成测试
// ==========================================
// 职责: 验证 FIFO 晋升、连续重编号、带原因跳过与任务幂等
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

use sis_registration::api::RegistrationApi;
use sis_registration::domain::types::EnrollmentStatus;
use sis_registration::engine::promotion_queue::{PromotionQueue, PromotionTrigger};
use sis_registration::engine::sweeper::WaitlistSweeper;
use sis_registration::engine::worker::PromotionWorker;
use sis_registration::engine::OptionalEventPublisher;
use sis_registration::repository::course_repo::CourseSectionRepository;
use sis_registration::repository::enrollment_repo::EnrollmentRepository;
use std::sync::Arc;
use test_helpers::*;

/// 容量 1 的教学班 + 三名学生
fn setup_tight_section() -> (tempfile::NamedTempFile, RegistrationApi) {
    let (temp_file, db_path) = create_test_db().unwrap();
    let conn = open_shared(&db_path);
    {
        let c = conn.lock().unwrap();
        seed_open_term(&c, "2026-FALL");
        seed_course(&c, "CS101", 3.0, &[]);
        seed_section(&c, "CS101-01", "CS101", "2026-FALL", 1, 5);
        for s in ["S-A", "S-B", "S-C"] {
            seed_student_with_ticket(&c, s, "2026-FALL");
        }
    }
    (temp_file, RegistrationApi::with_default_stack(conn))
}

#[test]
fn test_capacity_triggered_waitlist_scenario() {
    let (_db, api) = setup_tight_section();

    // A 选入, B 候补 position=1
    let a = api.register("S-A", "CS101-01", as_of_now()).unwrap();
    assert_eq!(a.status, EnrollmentStatus::Enrolled);
    let b = api.register("S-B", "CS101-01", as_of_now()).unwrap();
    assert_eq!(b.status, EnrollmentStatus::Waitlisted);
    assert_eq!(b.position, Some(1));

    // A 退选: 同步检测-派发-晋升在本次调用内完成
    api.withdraw(&a.enrollment_id, "S-A").unwrap();

    let promoted = api.query_enrollments(
        &sis_registration::repository::EnrollmentQueryFilter::new()
            .by_student("S-B")
            .by_section("CS101-01"),
    )
    .unwrap();
    assert_eq!(promoted.len(), 1);
    assert_eq!(promoted[0].enrollment.status, EnrollmentStatus::Enrolled);
    assert!(promoted[0].enrollment.position.is_none());

    // 名额守恒: count=1, 候补清空
    let occ = api.section_occupancy("CS101-01").unwrap();
    assert_eq!(occ.enrolled_count, 1);
    assert_eq!(occ.waitlisted_count, 0);

    // B 的历史: WAITLISTED -> PROMOTED
    let history = api.enrollment_history("S-B", "CS101-01").unwrap();
    let reasons: Vec<&str> = history.iter().map(|h| h.reason.as_str()).collect();
    assert_eq!(reasons, vec!["WAITLISTED", "PROMOTED"]);
}

#[test]
fn test_fifo_order_and_contiguous_renumbering() {
    let (_db, api) = setup_tight_section();

    let a = api.register("S-A", "CS101-01", as_of_now()).unwrap();
    let b = api.register("S-B", "CS101-01", as_of_now()).unwrap();
    let c = api.register("S-C", "CS101-01", as_of_now()).unwrap();
    assert_eq!(b.position, Some(1));
    assert_eq!(c.position, Some(2));

    api.withdraw(&a.enrollment_id, "S-A").unwrap();

    // position=1 的 B 先于 C 晋升; C 重编号为 1
    let waitlist = api.waitlist("CS101-01").unwrap();
    assert_eq!(waitlist.len(), 1);
    assert_eq!(waitlist[0].student_id, "S-C");
    assert_eq!(waitlist[0].position, Some(1));

    let b_now = api
        .query_enrollments(
            &sis_registration::repository::EnrollmentQueryFilter::new().by_student("S-B"),
        )
        .unwrap();
    assert_eq!(b_now[0].enrollment.status, EnrollmentStatus::Enrolled);
}

#[test]
fn test_promotion_skips_ineligible_with_reason_and_continues() {
    let (temp_file, db_path) = create_test_db().unwrap();
    let conn = open_shared(&db_path);
    {
        let c = conn.lock().unwrap();
        seed_open_term(&c, "2026-FALL");
        seed_course(&c, "CS101", 3.0, &[]);
        seed_section(&c, "CS101-01", "CS101", "2026-FALL", 1, 5);
        for s in ["S-A", "S-B", "S-C"] {
            seed_student_with_ticket(&c, s, "2026-FALL");
        }
    }
    let api = RegistrationApi::with_default_stack(conn.clone());
    let _keep = temp_file;

    let a = api.register("S-A", "CS101-01", as_of_now()).unwrap();
    api.register("S-B", "CS101-01", as_of_now()).unwrap();
    api.register("S-C", "CS101-01", as_of_now()).unwrap();

    // B 候补期间新增财务限制: 复核必然失败
    {
        let c = conn.lock().unwrap();
        seed_hold(&c, "H-B", "S-B", "FINANCIAL");
    }

    api.withdraw(&a.enrollment_id, "S-A").unwrap();

    // B 被按原因退出队列, 同一轮里 C 晋升
    let b_views = api
        .query_enrollments(
            &sis_registration::repository::EnrollmentQueryFilter::new().by_student("S-B"),
        )
        .unwrap();
    assert_eq!(b_views[0].enrollment.status, EnrollmentStatus::Dropped);
    assert_eq!(
        b_views[0].enrollment.drop_reason.as_deref(),
        Some("REGISTRATION_HOLD")
    );

    let c_views = api
        .query_enrollments(
            &sis_registration::repository::EnrollmentQueryFilter::new().by_student("S-C"),
        )
        .unwrap();
    assert_eq!(c_views[0].enrollment.status, EnrollmentStatus::Enrolled);

    // B 的跳过原因落在历史明细里, 不是静默消失
    let history = api.enrollment_history("S-B", "CS101-01").unwrap();
    let last = history.last().unwrap();
    assert_eq!(last.reason, "REGISTRATION_HOLD");
    assert!(last.detail.is_some());
}

#[test]
fn test_promotion_task_idempotent_with_zero_free_capacity() {
    let (temp_file, db_path) = create_test_db().unwrap();
    let conn = open_shared(&db_path);
    {
        let c = conn.lock().unwrap();
        seed_open_term(&c, "2026-FALL");
        seed_course(&c, "CS101", 3.0, &[]);
        seed_section(&c, "CS101-01", "CS101", "2026-FALL", 1, 5);
        for s in ["S-A", "S-B"] {
            seed_student_with_ticket(&c, s, "2026-FALL");
        }
    }

    let enrollment_repo = Arc::new(EnrollmentRepository::from_connection(conn.clone()));
    let section_repo = Arc::new(CourseSectionRepository::from_connection(conn.clone()));
    let worker = Arc::new(PromotionWorker::new(
        enrollment_repo.clone(),
        section_repo,
        OptionalEventPublisher::none(),
    ));
    let api = RegistrationApi::with_default_stack(conn.clone());
    let _keep = temp_file;

    api.register("S-A", "CS101-01", as_of_now()).unwrap();
    api.register("S-B", "CS101-01", as_of_now()).unwrap();

    // 没有空位: 执行两次, 两次都是空操作, 状态完全一致
    let first = worker.execute("CS101-01").unwrap();
    assert!(first.is_noop());
    let second = worker.execute("CS101-01").unwrap();
    assert!(second.is_noop());

    let occ = enrollment_repo.section_occupancy("CS101-01").unwrap();
    assert_eq!(occ.enrolled_count, 1);
    assert_eq!(occ.waitlisted_count, 1);

    let waitlist = enrollment_repo.waitlist("CS101-01").unwrap();
    assert_eq!(waitlist[0].student_id, "S-B");
    assert_eq!(waitlist[0].position, Some(1));
}

#[test]
fn test_sweeper_dispatches_one_task_per_qualifying_section() {
    let (temp_file, db_path) = create_test_db().unwrap();
    let conn = open_shared(&db_path);
    {
        let c = conn.lock().unwrap();
        seed_open_term(&c, "2026-FALL");
        seed_course(&c, "CS101", 3.0, &[]);
        // 三个教学班: 一个将出现空位且有候补(命中), 一个满员有候补,
        // 一个有空位无候补
        seed_section(&c, "HIT-01", "CS101", "2026-FALL", 1, 5);
        seed_section(&c, "FULL-01", "CS101", "2026-FALL", 1, 5);
        seed_section(&c, "EMPTY-01", "CS101", "2026-FALL", 5, 5);
        for s in ["S-A", "S-B", "S-C", "S-D"] {
            seed_student_with_ticket(&c, s, "2026-FALL");
        }
    }
    let api = RegistrationApi::with_default_stack(conn.clone());
    let _keep = temp_file;

    // HIT-01: 容量 1, A 选入 B 候补
    let a = api.register("S-A", "HIT-01", as_of_now()).unwrap();
    api.register("S-B", "HIT-01", as_of_now()).unwrap();
    // FULL-01: 满员 + 候补
    api.register("S-C", "FULL-01", as_of_now()).unwrap();
    api.register("S-D", "FULL-01", as_of_now()).unwrap();

    // 直接改库制造"有空位且有候补"而不触发退选派发:
    // 绕过 api, 模拟漏掉事件的场景(定时扫描兜底要能找回来)
    {
        let c = conn.lock().unwrap();
        c.execute(
            "UPDATE enrollment SET status = 'DROPPED', position = NULL,
             status_changed_at = created_at WHERE enrollment_id = ?1",
            rusqlite::params![a.enrollment_id],
        )
        .unwrap();
    }

    let enrollment_repo = Arc::new(EnrollmentRepository::from_connection(conn.clone()));
    let section_repo = Arc::new(CourseSectionRepository::from_connection(conn.clone()));
    let worker = Arc::new(PromotionWorker::new(
        enrollment_repo,
        section_repo,
        OptionalEventPublisher::none(),
    ));
    let queue = Arc::new(PromotionQueue::new(conn.clone(), worker));
    let sweeper = WaitlistSweeper::new(conn.clone(), queue.clone());

    // 只有 HIT-01 命中
    let dispatched = sweeper
        .sweep_once(PromotionTrigger::ScheduledSweep, Some("test".to_string()))
        .unwrap();
    assert_eq!(dispatched, 1);

    let promoted = queue.process_all().unwrap();
    assert_eq!(promoted, 1);

    // 再扫一遍: 已无命中, 空操作
    let dispatched = sweeper
        .sweep_once(PromotionTrigger::ScheduledSweep, Some("test".to_string()))
        .unwrap();
    assert_eq!(dispatched, 0);
}

#[test]
fn test_manual_check_waitlists_reports_counts() {
    let (_db, api) = setup_tight_section();

    let a = api.register("S-A", "CS101-01", as_of_now()).unwrap();
    api.register("S-B", "CS101-01", as_of_now()).unwrap();

    // 扫描前没有空位: 报告为零
    let report = api.check_waitlists_now().unwrap();
    assert_eq!(report.dispatched_tasks, 0);
    assert_eq!(report.promoted_students, 0);

    // withdraw 会同步晋升; 之后再手动检查应无事可做(幂等)
    api.withdraw(&a.enrollment_id, "S-A").unwrap();

    let report = api.check_waitlists_now().unwrap();
    assert_eq!(report.dispatched_tasks, 0);
    assert_eq!(report.promoted_students, 0);

    let occ = api.section_occupancy("CS101-01").unwrap();
    assert_eq!(occ.enrolled_count, 1);
    assert_eq!(occ.waitlisted_count, 0);
}
