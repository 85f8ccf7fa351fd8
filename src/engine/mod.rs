// ==========================================
// 高校选课系统 - 引擎层
// ==========================================
// 依据: 选课引擎设计说明 - 规则目录 / 候补晋升
// ==========================================
// 职责: 业务规则与候补晋升链路
// 红线: 规则必须输出带类型的违规值, 不抛异常、不静默
// ==========================================

pub mod event_adapter;
pub mod events;
pub mod promotion_queue;
pub mod rules;
pub mod sweeper;
pub mod validator;
pub mod worker;

// 重导出核心引擎
pub use event_adapter::PromotionDispatchAdapter;
pub use events::{
    EnrollmentEvent, EnrollmentEventPublisher, NoOpEventPublisher, OptionalEventPublisher,
};
pub use promotion_queue::{
    PromotionQueue, PromotionTask, PromotionTaskStatus, PromotionTrigger, QueueStats,
};
pub use rules::{UnavailableReason, Violation};
pub use sweeper::WaitlistSweeper;
pub use validator::{
    EnrollmentValidator, ValidationContext, ValidationResult, ValidationSnapshot,
};
pub use worker::PromotionWorker;
