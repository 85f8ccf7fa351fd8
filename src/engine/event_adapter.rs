// ==========================================
// 高校选课系统 - 事件到任务队列的适配器
// ==========================================
// 职责: 实现 EnrollmentEventPublisher, 把名额释放事件
//       转为扫描器的检测-派发调用
// 说明: 晋升成功/跳过事件属于通知系统的接入点,
//       适配器只记日志不处理
// ==========================================

use crate::engine::events::{EnrollmentEvent, EnrollmentEventPublisher};
use crate::engine::promotion_queue::PromotionTrigger;
use crate::engine::sweeper::WaitlistSweeper;
use std::error::Error;
use std::sync::Arc;

/// 名额释放事件 → 晋升任务派发 适配器
pub struct PromotionDispatchAdapter {
    sweeper: Arc<WaitlistSweeper>,
}

impl PromotionDispatchAdapter {
    pub fn new(sweeper: Arc<WaitlistSweeper>) -> Self {
        Self { sweeper }
    }
}

impl EnrollmentEventPublisher for PromotionDispatchAdapter {
    fn publish(&self, event: EnrollmentEvent) -> Result<String, Box<dyn Error + Send + Sync>> {
        match event {
            EnrollmentEvent::CapacityFreed { section_id, freed_seats } => {
                tracing::debug!(
                    "收到名额释放事件: section_id={}, freed_seats={}",
                    section_id,
                    freed_seats
                );
                let task_id = self
                    .sweeper
                    .dispatch_for_section(
                        &section_id,
                        PromotionTrigger::CapacityFreed,
                        Some("capacity-freed-event".to_string()),
                    )
                    .map_err(|e| Box::new(e) as Box<dyn Error + Send + Sync>)?;
                Ok(task_id.unwrap_or_default())
            }
            // 通知系统的订阅点: 这里只留痕
            EnrollmentEvent::WaitlistPromoted {
                enrollment_id,
                student_id,
                section_id,
            } => {
                tracing::debug!(
                    "晋升事件待通知系统消费: enrollment_id={}, student_id={}, section_id={}",
                    enrollment_id,
                    student_id,
                    section_id
                );
                Ok(String::new())
            }
            EnrollmentEvent::PromotionSkipped { .. } => Ok(String::new()),
        }
    }
}
