// ==========================================
// 高校选课系统 - 引擎层事件发布
// ==========================================
// 职责: 定义选课事件发布 trait，实现依赖倒置
// 说明: 仓储层发布事件，后台晋升链路实现适配器消费;
//       通知系统(站内信/邮件)作为下游订阅方自行消费
// ==========================================

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;

// ==========================================
// 选课事件类型
// ==========================================

/// 选课事件
///
/// 仓储在事务提交后发布; 事件本身不携带业务决策,
/// 下游(晋升调度、通知)各取所需。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrollmentEvent {
    /// 教学班释放了名额(退选/取消), 携带释放前的占用状态
    CapacityFreed {
        section_id: String,
        freed_seats: i64,
    },
    /// 候补晋升成功(WAITLISTED -> ENROLLED), 通知系统据此发信
    WaitlistPromoted {
        enrollment_id: String,
        student_id: String,
        section_id: String,
    },
    /// 晋升复核未通过, 候补记录按原因退出队列
    PromotionSkipped {
        enrollment_id: String,
        student_id: String,
        section_id: String,
        reason_code: String,
    },
}

impl EnrollmentEvent {
    /// 事件类型标识(日志/排障用)
    pub fn kind(&self) -> &'static str {
        match self {
            EnrollmentEvent::CapacityFreed { .. } => "CapacityFreed",
            EnrollmentEvent::WaitlistPromoted { .. } => "WaitlistPromoted",
            EnrollmentEvent::PromotionSkipped { .. } => "PromotionSkipped",
        }
    }

    /// 事件关联的教学班
    pub fn section_id(&self) -> &str {
        match self {
            EnrollmentEvent::CapacityFreed { section_id, .. }
            | EnrollmentEvent::WaitlistPromoted { section_id, .. }
            | EnrollmentEvent::PromotionSkipped { section_id, .. } => section_id,
        }
    }
}

// ==========================================
// 事件发布 Trait
// ==========================================

/// 选课事件发布者 Trait
///
/// 仓储层定义并调用, 调度层实现适配器
/// (CapacityFreed -> 晋升任务入队), 避免仓储直接依赖队列。
pub trait EnrollmentEventPublisher: Send + Sync {
    /// 发布选课事件
    ///
    /// # 返回
    /// - Ok(task_id): 任务 ID（如果适配器产生了任务）或空字符串
    /// - Err: 发布失败
    fn publish(&self, event: EnrollmentEvent) -> Result<String, Box<dyn Error + Send + Sync>>;
}

/// 空操作事件发布者
///
/// 用于不需要事件发布的场景（如单元测试）
#[derive(Debug, Clone, Default)]
pub struct NoOpEventPublisher;

impl EnrollmentEventPublisher for NoOpEventPublisher {
    fn publish(&self, event: EnrollmentEvent) -> Result<String, Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            "NoOpEventPublisher: 跳过事件发布 - kind={}, section_id={}",
            event.kind(),
            event.section_id()
        );
        Ok(String::new())
    }
}

/// 可选的事件发布者包装
///
/// 简化 Option<Arc<dyn EnrollmentEventPublisher>> 的使用
pub struct OptionalEventPublisher {
    inner: Option<Arc<dyn EnrollmentEventPublisher>>,
}

impl OptionalEventPublisher {
    /// 创建带发布者的实例
    pub fn with_publisher(publisher: Arc<dyn EnrollmentEventPublisher>) -> Self {
        Self {
            inner: Some(publisher),
        }
    }

    /// 创建空实例（不发布事件）
    pub fn none() -> Self {
        Self { inner: None }
    }

    /// 发布事件（如果有发布者）
    ///
    /// 发布失败只记日志不上抛: 事件链路故障不能回滚已提交的选课事务,
    /// 定时扫描是漏事件的兜底。
    pub fn publish(&self, event: EnrollmentEvent) {
        if let Some(publisher) = &self.inner {
            if let Err(e) = publisher.publish(event.clone()) {
                tracing::error!(
                    "事件发布失败(等待定时扫描兜底): kind={}, section_id={}, error={}",
                    event.kind(),
                    event.section_id(),
                    e
                );
            }
        } else {
            tracing::debug!(
                "OptionalEventPublisher: 未配置发布者，跳过事件 - kind={}, section_id={}",
                event.kind(),
                event.section_id()
            );
        }
    }

    /// 检查是否配置了发布者
    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }
}

impl Default for OptionalEventPublisher {
    fn default() -> Self {
        Self::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_accessors() {
        let event = EnrollmentEvent::WaitlistPromoted {
            enrollment_id: "E1".to_string(),
            student_id: "S001".to_string(),
            section_id: "SEC1".to_string(),
        };
        assert_eq!(event.kind(), "WaitlistPromoted");
        assert_eq!(event.section_id(), "SEC1");
    }

    #[test]
    fn test_noop_publisher() {
        let publisher = NoOpEventPublisher;
        let result = publisher.publish(EnrollmentEvent::CapacityFreed {
            section_id: "SEC1".to_string(),
            freed_seats: 1,
        });
        assert!(result.is_ok());
        assert!(result.unwrap().is_empty());
    }

    #[test]
    fn test_optional_publisher() {
        let publisher = OptionalEventPublisher::none();
        assert!(!publisher.is_configured());
        // 无发布者时静默跳过
        publisher.publish(EnrollmentEvent::CapacityFreed {
            section_id: "SEC1".to_string(),
            freed_seats: 1,
        });

        let noop = Arc::new(NoOpEventPublisher) as Arc<dyn EnrollmentEventPublisher>;
        let publisher = OptionalEventPublisher::with_publisher(noop);
        assert!(publisher.is_configured());
    }
}
