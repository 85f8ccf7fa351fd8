// ==========================================
// 高校选课系统 - 候补晋升执行器
// ==========================================
// 依据: 选课引擎设计说明 - 候补晋升
// 职责: 消费单个教学班的晋升任务, 调用仓储完成晋升,
//       并把晋升/跳过结果发布给下游(通知系统)
// 红线: 不得晋升超过真实空位数; 该约束由仓储的同事务
//       占用推导保证, 不依赖任务层的并发控制
// ==========================================

use crate::engine::events::{EnrollmentEvent, OptionalEventPublisher};
use crate::repository::course_repo::CourseSectionRepository;
use crate::repository::enrollment_repo::{EnrollmentRepository, PromotionOutcome};
use crate::repository::error::{RepositoryError, RepositoryResult};
use std::sync::Arc;
use tracing::instrument;

/// 候补晋升执行器
///
/// 幂等: 同一任务重复投递时, 第二次执行发现没有空位,
/// 不产生任何状态变更。
pub struct PromotionWorker {
    enrollment_repo: Arc<EnrollmentRepository>,
    section_repo: Arc<CourseSectionRepository>,
    events: OptionalEventPublisher,
}

impl PromotionWorker {
    pub fn new(
        enrollment_repo: Arc<EnrollmentRepository>,
        section_repo: Arc<CourseSectionRepository>,
        events: OptionalEventPublisher,
    ) -> Self {
        Self {
            enrollment_repo,
            section_repo,
            events,
        }
    }

    /// 执行一个教学班的晋升任务
    ///
    /// # 返回
    /// - Ok(outcome): 晋升与跳过明细(可能为空操作)
    /// - Err(NotFound): 教学班不存在, 任务应永久失败
    /// - Err(其他): 瞬时故障, 任务层按重试策略处理
    #[instrument(skip(self), fields(section_id = %section_id))]
    pub fn execute(&self, section_id: &str) -> RepositoryResult<PromotionOutcome> {
        let Some(section) = self.section_repo.find_by_id(section_id)? else {
            return Err(RepositoryError::NotFound {
                entity: "CourseSection".to_string(),
                id: section_id.to_string(),
            });
        };

        let occupancy = self.enrollment_repo.section_occupancy(section_id)?;
        let free_seats = occupancy.free_seats(section.capacity);
        if free_seats == 0 {
            // 任务重复投递或空位已被选课请求占走: 无事可做
            tracing::debug!(
                "晋升任务无空位可用: section_id={}, enrolled={}, capacity={}",
                section_id,
                occupancy.enrolled_count,
                section.capacity
            );
            return Ok(PromotionOutcome::default());
        }

        let outcome = self.enrollment_repo.try_promote(section_id, free_seats)?;

        // 事务提交后对外发布事件
        for promoted in &outcome.promoted {
            self.events.publish(EnrollmentEvent::WaitlistPromoted {
                enrollment_id: promoted.enrollment_id.clone(),
                student_id: promoted.student_id.clone(),
                section_id: section_id.to_string(),
            });
        }
        for skip in &outcome.skipped {
            self.events.publish(EnrollmentEvent::PromotionSkipped {
                enrollment_id: skip.enrollment.enrollment_id.clone(),
                student_id: skip.enrollment.student_id.clone(),
                section_id: section_id.to_string(),
                reason_code: skip.violation.code().to_string(),
            });
        }

        if !outcome.is_noop() {
            tracing::info!(
                "晋升任务执行完成: section_id={}, promoted={}, skipped={}",
                section_id,
                outcome.promoted.len(),
                outcome.skipped.len()
            );
        }

        Ok(outcome)
    }
}
