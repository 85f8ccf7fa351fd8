// ==========================================
// 高校选课系统 - 选课业务 API
// ==========================================
// 依据: 选课引擎设计说明 - 对外接口
// 职责: HTTP 控制器与运维入口调用的业务门面
// 说明: 控制器只做参数解析与错误码映射, 所有决策在引擎内
// ==========================================

use crate::domain::course::SectionOccupancy;
use crate::domain::Enrollment;
use crate::engine::events::{EnrollmentEvent, OptionalEventPublisher};
use crate::engine::promotion_queue::{PromotionQueue, PromotionTrigger, QueueStats};
use crate::engine::sweeper::WaitlistSweeper;
use crate::engine::worker::PromotionWorker;
use crate::engine::PromotionDispatchAdapter;
use crate::api::error::{ApiError, ApiResult};
use crate::repository::course_repo::CourseSectionRepository;
use crate::repository::enrollment_query::{
    EnrollmentQueryFilter, EnrollmentQueryRepository, EnrollmentView,
};
use crate::repository::enrollment_repo::{EnrollmentDecision, EnrollmentRepository};
use crate::repository::history_repo::{EnrollmentHistoryEntry, EnrollmentHistoryRepository};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::instrument;

// ==========================================
// SweepReport - 扫描执行报告
// ==========================================

/// "立即检查候补"的执行报告(运维诊断输出)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepReport {
    /// 本轮派发的晋升任务数
    pub dispatched_tasks: usize,
    /// 本轮累计晋升人数
    pub promoted_students: usize,
}

// ==========================================
// RegistrationApi - 选课业务门面
// ==========================================

/// 选课业务门面
pub struct RegistrationApi {
    enrollment_repo: Arc<EnrollmentRepository>,
    query_repo: Arc<EnrollmentQueryRepository>,
    history_repo: Arc<EnrollmentHistoryRepository>,
    sweeper: Arc<WaitlistSweeper>,
    queue: Arc<PromotionQueue>,
    events: OptionalEventPublisher,
}

impl RegistrationApi {
    /// 从已装配的组件创建
    pub fn new(
        enrollment_repo: Arc<EnrollmentRepository>,
        query_repo: Arc<EnrollmentQueryRepository>,
        history_repo: Arc<EnrollmentHistoryRepository>,
        sweeper: Arc<WaitlistSweeper>,
        queue: Arc<PromotionQueue>,
        events: OptionalEventPublisher,
    ) -> Self {
        Self {
            enrollment_repo,
            query_repo,
            history_repo,
            sweeper,
            queue,
            events,
        }
    }

    /// 在一个数据库连接上装配标准链路
    ///
    /// 装配关系: 退选释放名额 -> CapacityFreed 事件 ->
    /// 派发适配器 -> 任务队列 -> 晋升执行器
    pub fn with_default_stack(conn: Arc<Mutex<Connection>>) -> Self {
        let enrollment_repo = Arc::new(EnrollmentRepository::from_connection(conn.clone()));
        let section_repo = Arc::new(CourseSectionRepository::from_connection(conn.clone()));
        let query_repo = Arc::new(EnrollmentQueryRepository::from_connection(conn.clone()));
        let history_repo = Arc::new(EnrollmentHistoryRepository::from_connection(conn.clone()));

        let worker = Arc::new(PromotionWorker::new(
            enrollment_repo.clone(),
            section_repo,
            OptionalEventPublisher::none(),
        ));
        let queue = Arc::new(PromotionQueue::new(conn.clone(), worker));
        let sweeper = Arc::new(WaitlistSweeper::new(conn, queue.clone()));
        let adapter = Arc::new(PromotionDispatchAdapter::new(sweeper.clone()));

        Self::new(
            enrollment_repo,
            query_repo,
            history_repo,
            sweeper,
            queue,
            OptionalEventPublisher::with_publisher(adapter),
        )
    }

    // ==========================================
    // 选课 / 退选
    // ==========================================

    /// 受理一次选课请求
    ///
    /// # 参数
    /// - student_id / section_id: 选课对象
    /// - as_of: 请求发生时刻(控制器取请求时间)
    ///
    /// # 返回
    /// - Ok(enrollment): 已选入或已候补的记录
    /// - Err(RegistrationRejected): 规则拒绝, 携带完整违规值
    /// - Err(其他): 系统故障
    #[instrument(skip(self), fields(student_id = %student_id, section_id = %section_id))]
    pub fn register(
        &self,
        student_id: &str,
        section_id: &str,
        as_of: DateTime<Utc>,
    ) -> ApiResult<Enrollment> {
        match self
            .enrollment_repo
            .try_enroll(student_id, section_id, as_of, student_id)?
        {
            EnrollmentDecision::Enrolled(enrollment)
            | EnrollmentDecision::Waitlisted(enrollment) => Ok(enrollment),
            EnrollmentDecision::Rejected(violation) => {
                Err(ApiError::RegistrationRejected(violation))
            }
        }
    }

    /// 退选
    ///
    /// 释放名额时同步走一遍检测-派发(与定时扫描同一条代码路径),
    /// 并立即清空任务队列, 让候补学生在本次调用内完成晋升。
    #[instrument(skip(self), fields(enrollment_id = %enrollment_id))]
    pub fn withdraw(&self, enrollment_id: &str, actor: &str) -> ApiResult<Enrollment> {
        let outcome = self.enrollment_repo.withdraw(enrollment_id, actor)?;

        if outcome.freed_seat {
            self.events.publish(EnrollmentEvent::CapacityFreed {
                section_id: outcome.enrollment.section_id.clone(),
                freed_seats: 1,
            });
            self.queue.process_all()?;
        }

        Ok(outcome.enrollment)
    }

    // ==========================================
    // 运维入口
    // ==========================================

    /// 立即检查全部候补队列(运维手动触发 / 定时兜底复用)
    ///
    /// # 返回
    /// - SweepReport: 派发任务数与晋升人数
    pub fn check_waitlists_now(&self) -> ApiResult<SweepReport> {
        let dispatched_tasks = self
            .sweeper
            .sweep_once(PromotionTrigger::ManualSweep, Some("operator".to_string()))?;
        let promoted_students = self.queue.process_all()?;

        tracing::info!(
            "候补检查完成: dispatched={}, promoted={}",
            dispatched_tasks,
            promoted_students
        );

        Ok(SweepReport {
            dispatched_tasks,
            promoted_students,
        })
    }

    /// 学期结课钩子: ENROLLED -> COMPLETED
    pub fn close_term(&self, term_id: &str) -> ApiResult<usize> {
        Ok(self.enrollment_repo.complete_term(term_id)?)
    }

    /// 定时兜底循环(不返回, 随运行时关闭而取消)
    pub async fn run_scheduled(&self, interval_secs: u64) {
        self.sweeper.run_scheduled(interval_secs).await
    }

    /// 任务队列统计(运维诊断)
    pub fn queue_stats(&self) -> ApiResult<QueueStats> {
        Ok(self.queue.stats()?)
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 按组合条件查询选课记录(报表)
    pub fn query_enrollments(
        &self,
        filter: &EnrollmentQueryFilter,
    ) -> ApiResult<Vec<EnrollmentView>> {
        Ok(self.query_repo.query(filter)?)
    }

    /// 教学班占用快照
    pub fn section_occupancy(&self, section_id: &str) -> ApiResult<SectionOccupancy> {
        Ok(self.enrollment_repo.section_occupancy(section_id)?)
    }

    /// 教学班候补队列
    pub fn waitlist(&self, section_id: &str) -> ApiResult<Vec<Enrollment>> {
        Ok(self.enrollment_repo.waitlist(section_id)?)
    }

    /// 一个 (学生, 教学班) 组合的完整流转历史
    pub fn enrollment_history(
        &self,
        student_id: &str,
        section_id: &str,
    ) -> ApiResult<Vec<EnrollmentHistoryEntry>> {
        Ok(self.history_repo.find_by_pair(student_id, section_id)?)
    }
}
