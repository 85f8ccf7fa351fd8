// ==========================================
// 高校选课系统 - 选课记录仓储
// ==========================================
// 依据: 选课引擎设计说明 - 仓储操作 / 并发模型
// ==========================================
// 职责: 全系统唯一允许改写选课记录与教学班占用的组件
// 红线: 容量判定与落库必须同事务, 杜绝"检查与提交之间被并发抢位"
// 红线: 候补 position 在任何删除/晋升后保持从 1 起连续
// 红线: 记录只迁移不删除, 每次迁移与历史留痕同事务
// ==========================================

use crate::config::RegistrationPolicy;
use crate::domain::course::SectionOccupancy;
use crate::domain::types::EnrollmentStatus;
use crate::domain::{Course, CourseSection, Enrollment, Term};
use crate::engine::rules::Violation;
use crate::engine::validator::{
    EnrollmentValidator, ValidationContext, ValidationResult, ValidationSnapshot,
};
use crate::repository::course_repo::{CourseRepository, CourseSectionRepository};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::history_repo::{EnrollmentHistoryEntry, EnrollmentHistoryRepository};
use crate::repository::record_repo::AcademicRecordRepository;
use crate::repository::student_repo::StudentRepository;
use crate::repository::term_repo::TermRepository;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};
use tracing::instrument;

// ==========================================
// 操作结果类型
// ==========================================

/// try_enroll 的落库结果
///
/// 业务违规是值不是错误: Err 只留给基础设施故障。
#[derive(Debug, Clone)]
pub enum EnrollmentDecision {
    /// 有名额, 已选入
    Enrolled(Enrollment),
    /// 名额已满, 进入候补队列
    Waitlisted(Enrollment),
    /// 规则拒绝
    Rejected(Violation),
}

/// 晋升中被跳过的候补记录
#[derive(Debug, Clone)]
pub struct PromotionSkip {
    pub enrollment: Enrollment,
    pub violation: Violation,
}

/// try_promote 的执行结果
#[derive(Debug, Clone, Default)]
pub struct PromotionOutcome {
    /// 成功晋升的记录(按晋升次序)
    pub promoted: Vec<Enrollment>,
    /// 复核未通过而退出队列的记录(附原因)
    pub skipped: Vec<PromotionSkip>,
}

impl PromotionOutcome {
    pub fn is_noop(&self) -> bool {
        self.promoted.is_empty() && self.skipped.is_empty()
    }
}

/// withdraw 的执行结果
#[derive(Debug, Clone)]
pub struct WithdrawalOutcome {
    /// 迁移后的记录(status = DROPPED)
    pub enrollment: Enrollment,
    /// 是否释放了一个已占用名额(原状态为 ENROLLED)
    pub freed_seat: bool,
}

// ==========================================
// EnrollmentRepository - 选课记录仓储
// ==========================================

/// 选课记录仓储
///
/// 进程内以 Arc<Mutex<Connection>> 串行化对同一数据库的写入,
/// 事务保证崩溃原子性; 两者合起来满足"同一教学班同一时刻
/// 至多一个生效的占位决定"。
pub struct EnrollmentRepository {
    conn: Arc<Mutex<Connection>>,
    validator: EnrollmentValidator,
}

impl EnrollmentRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            conn,
            validator: EnrollmentValidator::new(),
        }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // try_enroll - 选课请求落库
    // ==========================================

    /// 校验并落库一次选课请求
    ///
    /// # 参数
    /// - student_id: 学号
    /// - section_id: 教学班 ID
    /// - as_of: 请求发生时刻
    /// - actor: 操作方(学生本人或管理员)
    ///
    /// # 返回
    /// - Enrolled / Waitlisted: 已创建记录
    /// - Rejected(violation): 规则拒绝, 未落任何行
    /// - Err: 基础设施故障
    ///
    /// # 并发
    /// 规则 1-8 与容量路由(规则 9)在同一事务内完成;
    /// 并发调用者不可能基于过期容量同时挤进最后一个名额。
    #[instrument(skip(self), fields(student_id = %student_id, section_id = %section_id))]
    pub fn try_enroll(
        &self,
        student_id: &str,
        section_id: &str,
        as_of: DateTime<Utc>,
        actor: &str,
    ) -> RepositoryResult<EnrollmentDecision> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let (section, course, term) = load_section_context(&tx, section_id)?;
        let snapshot = load_snapshot(&tx, student_id, &section, &course, &term)?;

        // 规则 1-8
        if let ValidationResult::Rejected(violation) =
            self.validator
                .validate(&snapshot, as_of, ValidationContext::Registration)
        {
            // 事务随 drop 回滚, 不留任何行
            tracing::info!(
                "选课请求被拒绝: student_id={}, section_id={}, code={}",
                student_id,
                section_id,
                violation.code()
            );
            return Ok(EnrollmentDecision::Rejected(violation));
        }

        // 规则 9: 容量路由(同事务)
        let occupancy = occupancy_with_conn(&tx, section_id)?;
        let decision = if occupancy.enrolled_count < section.capacity {
            let enrollment =
                Enrollment::new_enrolled(student_id.to_string(), section_id.to_string());
            insert_enrollment(&tx, &enrollment)?;
            EnrollmentHistoryRepository::append_with_conn(
                &tx,
                &EnrollmentHistoryEntry::new(
                    &enrollment.enrollment_id,
                    student_id,
                    section_id,
                    None,
                    EnrollmentStatus::Enrolled.to_db_str(),
                    "REGISTERED",
                    None,
                    actor,
                ),
            )?;
            EnrollmentDecision::Enrolled(enrollment)
        } else if occupancy.waitlisted_count < section.waitlist_capacity {
            let position = next_waitlist_position(&tx, section_id)?;
            let enrollment = Enrollment::new_waitlisted(
                student_id.to_string(),
                section_id.to_string(),
                position,
            );
            insert_enrollment(&tx, &enrollment)?;
            EnrollmentHistoryRepository::append_with_conn(
                &tx,
                &EnrollmentHistoryEntry::new(
                    &enrollment.enrollment_id,
                    student_id,
                    section_id,
                    None,
                    EnrollmentStatus::Waitlisted.to_db_str(),
                    "WAITLISTED",
                    Some(serde_json::json!({ "position": position })),
                    actor,
                ),
            )?;
            EnrollmentDecision::Waitlisted(enrollment)
        } else {
            tracing::info!(
                "选课请求被拒绝(名额与候补均满): student_id={}, section_id={}, capacity={}, waitlist_capacity={}",
                student_id,
                section_id,
                section.capacity,
                section.waitlist_capacity
            );
            return Ok(EnrollmentDecision::Rejected(
                Violation::EnrollmentCapacityExceeded {
                    capacity: section.capacity,
                    waitlist_capacity: section.waitlist_capacity,
                },
            ));
        };

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        match &decision {
            EnrollmentDecision::Enrolled(e) => tracing::info!(
                "选课成功: enrollment_id={}, student_id={}, section_id={}",
                e.enrollment_id,
                student_id,
                section_id
            ),
            EnrollmentDecision::Waitlisted(e) => tracing::info!(
                "进入候补队列: enrollment_id={}, student_id={}, section_id={}, position={:?}",
                e.enrollment_id,
                student_id,
                section_id,
                e.position
            ),
            EnrollmentDecision::Rejected(_) => {}
        }

        Ok(decision)
    }

    // ==========================================
    // try_promote - 候补晋升
    // ==========================================

    /// 为一个教学班执行候补晋升
    ///
    /// 每次循环处理队首一条候补, 单条一个事务:
    /// 复核通过则晋升, 未通过则按原因退出队列并继续下一条。
    /// 每轮重新推导空位数, 过期的 max_count 不可能导致超卖。
    ///
    /// # 参数
    /// - section_id: 教学班 ID
    /// - max_count: 本次最多晋升人数(调用方对空位数的估计)
    ///
    /// # 幂等
    /// 空位耗尽或队列为空时为空操作, 重复投递无副作用。
    #[instrument(skip(self), fields(section_id = %section_id))]
    pub fn try_promote(
        &self,
        section_id: &str,
        max_count: i64,
    ) -> RepositoryResult<PromotionOutcome> {
        let mut outcome = PromotionOutcome::default();

        loop {
            if (outcome.promoted.len() as i64) >= max_count {
                break;
            }

            let mut conn = self.get_conn()?;
            let tx = conn
                .transaction()
                .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

            let (section, course, term) = load_section_context(&tx, section_id)?;

            // 每轮以库内真实占用为准
            let occupancy = occupancy_with_conn(&tx, section_id)?;
            if occupancy.free_seats(section.capacity) <= 0 {
                break;
            }

            // 队首: 最小 position 的候补记录
            let Some(head) = find_waitlist_head(&tx, section_id)? else {
                break;
            };
            let head_position = head.position.unwrap_or(1);

            // 复核规则 1-8(重复与容量除外): 候补期间限制/学分可能已变化
            let snapshot = load_snapshot(&tx, &head.student_id, &section, &course, &term)?;
            let now = Utc::now();

            match self
                .validator
                .validate(&snapshot, now, ValidationContext::Promotion)
            {
                ValidationResult::Accepted => {
                    tx.execute(
                        r#"
                        UPDATE enrollment
                        SET status = 'ENROLLED', position = NULL, status_changed_at = ?1
                        WHERE enrollment_id = ?2
                        "#,
                        params![now.to_rfc3339(), head.enrollment_id],
                    )?;
                    renumber_after_removal(&tx, section_id, head_position)?;
                    EnrollmentHistoryRepository::append_with_conn(
                        &tx,
                        &EnrollmentHistoryEntry::new(
                            &head.enrollment_id,
                            &head.student_id,
                            section_id,
                            Some(EnrollmentStatus::Waitlisted.to_db_str()),
                            EnrollmentStatus::Enrolled.to_db_str(),
                            "PROMOTED",
                            None,
                            "promotion-worker",
                        ),
                    )?;
                    tx.commit()
                        .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

                    tracing::info!(
                        "候补晋升成功: enrollment_id={}, student_id={}, section_id={}",
                        head.enrollment_id,
                        head.student_id,
                        section_id
                    );

                    let mut promoted = head;
                    promoted.status = EnrollmentStatus::Enrolled;
                    promoted.position = None;
                    promoted.status_changed_at = now;
                    outcome.promoted.push(promoted);
                }
                ValidationResult::Rejected(violation) => {
                    // 不允许静默跳过: 记录退出原因后继续下一位
                    let detail = serde_json::to_value(&violation).ok();
                    tx.execute(
                        r#"
                        UPDATE enrollment
                        SET status = 'DROPPED', position = NULL,
                            drop_reason = ?1, status_changed_at = ?2
                        WHERE enrollment_id = ?3
                        "#,
                        params![violation.code(), now.to_rfc3339(), head.enrollment_id],
                    )?;
                    renumber_after_removal(&tx, section_id, head_position)?;
                    EnrollmentHistoryRepository::append_with_conn(
                        &tx,
                        &EnrollmentHistoryEntry::new(
                            &head.enrollment_id,
                            &head.student_id,
                            section_id,
                            Some(EnrollmentStatus::Waitlisted.to_db_str()),
                            EnrollmentStatus::Dropped.to_db_str(),
                            violation.code(),
                            detail,
                            "promotion-worker",
                        ),
                    )?;
                    tx.commit()
                        .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

                    tracing::warn!(
                        "候补晋升复核未通过: enrollment_id={}, student_id={}, section_id={}, code={}",
                        head.enrollment_id,
                        head.student_id,
                        section_id,
                        violation.code()
                    );

                    let mut skipped = head;
                    skipped.status = EnrollmentStatus::Dropped;
                    skipped.position = None;
                    skipped.drop_reason = Some(violation.code().to_string());
                    skipped.status_changed_at = now;
                    outcome.skipped.push(PromotionSkip {
                        enrollment: skipped,
                        violation,
                    });
                }
            }
        }

        Ok(outcome)
    }

    // ==========================================
    // withdraw - 退选
    // ==========================================

    /// 退选一条选课记录
    ///
    /// ENROLLED -> DROPPED 释放一个名额(随后由调用方触发晋升派发);
    /// WAITLISTED -> DROPPED 只出队并重编号。
    #[instrument(skip(self), fields(enrollment_id = %enrollment_id))]
    pub fn withdraw(
        &self,
        enrollment_id: &str,
        actor: &str,
    ) -> RepositoryResult<WithdrawalOutcome> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let Some(mut enrollment) = find_by_id_with_conn(&tx, enrollment_id)? else {
            return Err(RepositoryError::NotFound {
                entity: "Enrollment".to_string(),
                id: enrollment_id.to_string(),
            });
        };

        if !enrollment.status.can_transition_to(EnrollmentStatus::Dropped) {
            return Err(RepositoryError::InvalidStateTransition {
                enrollment_id: enrollment_id.to_string(),
                from: enrollment.status.to_string(),
                to: EnrollmentStatus::Dropped.to_string(),
            });
        }

        let was_enrolled = enrollment.status == EnrollmentStatus::Enrolled;
        let from_status = enrollment.status;
        let old_position = enrollment.position;
        let now = Utc::now();

        tx.execute(
            r#"
            UPDATE enrollment
            SET status = 'DROPPED', position = NULL,
                drop_reason = 'WITHDRAWN', status_changed_at = ?1
            WHERE enrollment_id = ?2
            "#,
            params![now.to_rfc3339(), enrollment_id],
        )?;
        if let Some(position) = old_position {
            renumber_after_removal(&tx, &enrollment.section_id, position)?;
        }
        EnrollmentHistoryRepository::append_with_conn(
            &tx,
            &EnrollmentHistoryEntry::new(
                enrollment_id,
                &enrollment.student_id,
                &enrollment.section_id,
                Some(from_status.to_db_str()),
                EnrollmentStatus::Dropped.to_db_str(),
                "WITHDRAWN",
                None,
                actor,
            ),
        )?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tracing::info!(
            "退选完成: enrollment_id={}, section_id={}, freed_seat={}",
            enrollment_id,
            enrollment.section_id,
            was_enrolled
        );

        enrollment.status = EnrollmentStatus::Dropped;
        enrollment.position = None;
        enrollment.drop_reason = Some("WITHDRAWN".to_string());
        enrollment.status_changed_at = now;
        Ok(WithdrawalOutcome {
            enrollment,
            freed_seat: was_enrolled,
        })
    }

    // ==========================================
    // complete_term - 结课批处理钩子
    // ==========================================

    /// 将学期内全部 ENROLLED 记录迁移为 COMPLETED
    ///
    /// # 返回
    /// - Ok(count): 迁移的记录数
    pub fn complete_term(&self, term_id: &str) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let targets: Vec<Enrollment> = {
            let mut stmt = tx.prepare(
                r#"
                SELECT e.enrollment_id, e.student_id, e.section_id, e.status,
                       e.position, e.drop_reason, e.created_at, e.status_changed_at
                FROM enrollment e
                JOIN course_section s ON e.section_id = s.section_id
                WHERE s.term_id = ?1 AND e.status = 'ENROLLED'
                "#,
            )?;
            let rows = stmt.query_map(params![term_id], map_enrollment)?;
            let mut list = Vec::new();
            for row in rows {
                list.push(row?);
            }
            list
        };

        let now = Utc::now();
        for enrollment in &targets {
            tx.execute(
                "UPDATE enrollment SET status = 'COMPLETED', status_changed_at = ?1 WHERE enrollment_id = ?2",
                params![now.to_rfc3339(), enrollment.enrollment_id],
            )?;
            EnrollmentHistoryRepository::append_with_conn(
                &tx,
                &EnrollmentHistoryEntry::new(
                    &enrollment.enrollment_id,
                    &enrollment.student_id,
                    &enrollment.section_id,
                    Some(EnrollmentStatus::Enrolled.to_db_str()),
                    EnrollmentStatus::Completed.to_db_str(),
                    "TERM_COMPLETED",
                    None,
                    "term-close",
                ),
            )?;
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tracing::info!("学期结课迁移完成: term_id={}, count={}", term_id, targets.len());
        Ok(targets.len())
    }

    // ==========================================
    // 读取接口
    // ==========================================

    /// 按 ID 查询选课记录
    pub fn find_by_id(&self, enrollment_id: &str) -> RepositoryResult<Option<Enrollment>> {
        let conn = self.get_conn()?;
        find_by_id_with_conn(&conn, enrollment_id)
    }

    /// 教学班占用快照
    pub fn section_occupancy(&self, section_id: &str) -> RepositoryResult<SectionOccupancy> {
        let conn = self.get_conn()?;
        occupancy_with_conn(&conn, section_id)
    }

    /// 教学班候补队列(position 正序)
    pub fn waitlist(&self, section_id: &str) -> RepositoryResult<Vec<Enrollment>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT enrollment_id, student_id, section_id, status,
                   position, drop_reason, created_at, status_changed_at
            FROM enrollment
            WHERE section_id = ?1 AND status = 'WAITLISTED'
            ORDER BY position ASC
            "#,
        )?;
        let rows = stmt.query_map(params![section_id], map_enrollment)?;
        let mut list = Vec::new();
        for row in rows {
            list.push(row?);
        }
        Ok(list)
    }
}

// ==========================================
// 事务内取数与写入(供同事务复用)
// ==========================================

/// 加载教学班上下文(教学班 + 课程 + 学期)
fn load_section_context(
    conn: &Connection,
    section_id: &str,
) -> RepositoryResult<(CourseSection, Course, Term)> {
    let Some(section) = CourseSectionRepository::find_by_id_with_conn(conn, section_id)? else {
        return Err(RepositoryError::NotFound {
            entity: "CourseSection".to_string(),
            id: section_id.to_string(),
        });
    };
    let Some(course) = CourseRepository::find_by_code_with_conn(conn, &section.course_code)? else {
        return Err(RepositoryError::NotFound {
            entity: "Course".to_string(),
            id: section.course_code.clone(),
        });
    };
    let Some(term) = TermRepository::find_by_id_with_conn(conn, &section.term_id)? else {
        return Err(RepositoryError::NotFound {
            entity: "Term".to_string(),
            id: section.term_id.clone(),
        });
    };
    Ok((section, course, term))
}

/// 组装校验快照(事务内一次性取数)
fn load_snapshot(
    conn: &Connection,
    student_id: &str,
    section: &CourseSection,
    course: &Course,
    term: &Term,
) -> RepositoryResult<ValidationSnapshot> {
    let Some(student) = StudentRepository::find_by_id_with_conn(conn, student_id)? else {
        return Err(RepositoryError::NotFound {
            entity: "Student".to_string(),
            id: student_id.to_string(),
        });
    };

    let holds = StudentRepository::find_holds_with_conn(conn, student_id)?;
    let time_ticket =
        StudentRepository::find_time_ticket_with_conn(conn, student_id, &term.term_id)?;
    let records = AcademicRecordRepository::find_by_student_with_conn(conn, student_id)?;
    let live_pair_enrollments = find_live_pair_with_conn(conn, student_id, &section.section_id)?;
    let enrolled_credits = enrolled_credits_with_conn(conn, student_id, &term.term_id)?;
    let policy = RegistrationPolicy::load(conn);

    Ok(ValidationSnapshot {
        student,
        holds,
        time_ticket,
        course: course.clone(),
        section: section.clone(),
        term: term.clone(),
        live_pair_enrollments,
        records,
        enrolled_credits,
        policy,
    })
}

/// 推导教学班占用(同事务内与写入一致)
fn occupancy_with_conn(conn: &Connection, section_id: &str) -> RepositoryResult<SectionOccupancy> {
    let (enrolled_count, waitlisted_count) = conn.query_row(
        r#"
        SELECT
            COUNT(CASE WHEN status = 'ENROLLED' THEN 1 END),
            COUNT(CASE WHEN status = 'WAITLISTED' THEN 1 END)
        FROM enrollment
        WHERE section_id = ?1
        "#,
        params![section_id],
        |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
    )?;
    Ok(SectionOccupancy {
        enrolled_count,
        waitlisted_count,
    })
}

/// 该生在该教学班下的非终态记录
fn find_live_pair_with_conn(
    conn: &Connection,
    student_id: &str,
    section_id: &str,
) -> RepositoryResult<Vec<Enrollment>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT enrollment_id, student_id, section_id, status,
               position, drop_reason, created_at, status_changed_at
        FROM enrollment
        WHERE student_id = ?1 AND section_id = ?2
          AND status IN ('ENROLLED', 'WAITLISTED')
        "#,
    )?;
    let rows = stmt.query_map(params![student_id, section_id], map_enrollment)?;
    let mut list = Vec::new();
    for row in rows {
        list.push(row?);
    }
    Ok(list)
}

/// 该生本学期 ENROLLED 学分合计(候补不计入)
fn enrolled_credits_with_conn(
    conn: &Connection,
    student_id: &str,
    term_id: &str,
) -> RepositoryResult<f64> {
    let credits: f64 = conn.query_row(
        r#"
        SELECT COALESCE(SUM(c.credit_hours), 0)
        FROM enrollment e
        JOIN course_section s ON e.section_id = s.section_id
        JOIN course c ON s.course_code = c.course_code
        WHERE e.student_id = ?1 AND s.term_id = ?2 AND e.status = 'ENROLLED'
        "#,
        params![student_id, term_id],
        |row| row.get(0),
    )?;
    Ok(credits)
}

/// 队尾的下一个候补序号
fn next_waitlist_position(conn: &Connection, section_id: &str) -> RepositoryResult<i64> {
    let max: i64 = conn.query_row(
        "SELECT COALESCE(MAX(position), 0) FROM enrollment WHERE section_id = ?1 AND status = 'WAITLISTED'",
        params![section_id],
        |row| row.get(0),
    )?;
    Ok(max + 1)
}

/// 队首候补记录(最小 position)
fn find_waitlist_head(conn: &Connection, section_id: &str) -> RepositoryResult<Option<Enrollment>> {
    let head = conn
        .query_row(
            r#"
            SELECT enrollment_id, student_id, section_id, status,
                   position, drop_reason, created_at, status_changed_at
            FROM enrollment
            WHERE section_id = ?1 AND status = 'WAITLISTED'
            ORDER BY position ASC
            LIMIT 1
            "#,
            params![section_id],
            map_enrollment,
        )
        .optional()?;
    Ok(head)
}

/// 移除 position 后重编号, 保持候补序号从 1 起连续
fn renumber_after_removal(
    conn: &Connection,
    section_id: &str,
    removed_position: i64,
) -> RepositoryResult<()> {
    conn.execute(
        r#"
        UPDATE enrollment
        SET position = position - 1
        WHERE section_id = ?1 AND status = 'WAITLISTED' AND position > ?2
        "#,
        params![section_id, removed_position],
    )?;
    Ok(())
}

/// 插入选课记录行
fn insert_enrollment(conn: &Connection, enrollment: &Enrollment) -> RepositoryResult<()> {
    conn.execute(
        r#"
        INSERT INTO enrollment
            (enrollment_id, student_id, section_id, status, position,
             drop_reason, created_at, status_changed_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
        params![
            enrollment.enrollment_id,
            enrollment.student_id,
            enrollment.section_id,
            enrollment.status.to_db_str(),
            enrollment.position,
            enrollment.drop_reason,
            enrollment.created_at.to_rfc3339(),
            enrollment.status_changed_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

/// 按 ID 查询(事务内)
fn find_by_id_with_conn(
    conn: &Connection,
    enrollment_id: &str,
) -> RepositoryResult<Option<Enrollment>> {
    let enrollment = conn
        .query_row(
            r#"
            SELECT enrollment_id, student_id, section_id, status,
                   position, drop_reason, created_at, status_changed_at
            FROM enrollment
            WHERE enrollment_id = ?1
            "#,
            params![enrollment_id],
            map_enrollment,
        )
        .optional()?;
    Ok(enrollment)
}

// ===== 行映射 =====

pub(crate) fn map_enrollment(row: &Row<'_>) -> rusqlite::Result<Enrollment> {
    let status: String = row.get(3)?;
    Ok(Enrollment {
        enrollment_id: row.get(0)?,
        student_id: row.get(1)?,
        section_id: row.get(2)?,
        status: EnrollmentStatus::from_str(&status),
        position: row.get(4)?,
        drop_reason: row.get(5)?,
        created_at: row.get(6)?,
        status_changed_at: row.get(7)?,
    })
}
