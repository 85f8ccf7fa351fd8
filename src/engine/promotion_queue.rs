// ==========================================
// 高校选课系统 - 候补晋升任务队列
// ==========================================
// 依据: 选课引擎设计说明 - 候补晋升 / 并发模型
// 职责: 管理晋升任务队列, 提供至少一次投递与有界重试
// 说明: 队列落库, 进程重启后任务不丢; 同一教学班
//       至多一个待执行任务(重复入队直接复用)
// ==========================================

use crate::engine::worker::PromotionWorker;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

// ==========================================
// 任务状态与触发类型
// ==========================================

/// 晋升任务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromotionTaskStatus {
    /// 等待中
    Pending,
    /// 执行中
    Running,
    /// 已完成
    Completed,
    /// 失败(重试耗尽或永久失败)
    Failed,
    /// 已取消
    Cancelled,
}

impl PromotionTaskStatus {
    pub fn as_str(&self) -> &str {
        match self {
            PromotionTaskStatus::Pending => "PENDING",
            PromotionTaskStatus::Running => "RUNNING",
            PromotionTaskStatus::Completed => "COMPLETED",
            PromotionTaskStatus::Failed => "FAILED",
            PromotionTaskStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "PENDING" => PromotionTaskStatus::Pending,
            "RUNNING" => PromotionTaskStatus::Running,
            "COMPLETED" => PromotionTaskStatus::Completed,
            "CANCELLED" => PromotionTaskStatus::Cancelled,
            _ => PromotionTaskStatus::Failed,
        }
    }
}

/// 晋升任务触发类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromotionTrigger {
    /// 定时扫描(兜底)
    ScheduledSweep,
    /// 退选/取消释放名额
    CapacityFreed,
    /// 运维手动触发
    ManualSweep,
}

impl PromotionTrigger {
    pub fn as_str(&self) -> &str {
        match self {
            PromotionTrigger::ScheduledSweep => "ScheduledSweep",
            PromotionTrigger::CapacityFreed => "CapacityFreed",
            PromotionTrigger::ManualSweep => "ManualSweep",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "ScheduledSweep" => PromotionTrigger::ScheduledSweep,
            "CapacityFreed" => PromotionTrigger::CapacityFreed,
            _ => PromotionTrigger::ManualSweep,
        }
    }
}

// ==========================================
// 晋升任务
// ==========================================

/// 晋升任务
#[derive(Debug, Clone)]
pub struct PromotionTask {
    /// 任务 ID
    pub task_id: String,
    /// 教学班 ID
    pub section_id: String,
    /// 触发类型
    pub trigger: PromotionTrigger,
    /// 触发源
    pub trigger_source: Option<String>,
    /// 任务状态
    pub status: PromotionTaskStatus,
    /// 重试次数
    pub retry_count: i32,
    /// 最大重试次数
    pub max_retries: i32,
    /// 本任务累计晋升人数
    pub promoted_count: i32,
    /// 创建时间
    pub created_at: String,
    /// 开始执行时间
    pub started_at: Option<String>,
    /// 完成时间
    pub completed_at: Option<String>,
    /// 错误信息
    pub error_message: Option<String>,
}

impl PromotionTask {
    /// 创建新的晋升任务
    pub fn new(
        section_id: &str,
        trigger: PromotionTrigger,
        trigger_source: Option<String>,
        max_retries: i32,
    ) -> Self {
        Self {
            task_id: Uuid::new_v4().to_string(),
            section_id: section_id.to_string(),
            trigger,
            trigger_source,
            status: PromotionTaskStatus::Pending,
            retry_count: 0,
            max_retries,
            promoted_count: 0,
            created_at: Utc::now().to_rfc3339(),
            started_at: None,
            completed_at: None,
            error_message: None,
        }
    }

    /// 是否可以重试
    pub fn can_retry(&self) -> bool {
        self.status == PromotionTaskStatus::Failed && self.retry_count < self.max_retries
    }
}

// ==========================================
// 队列统计信息
// ==========================================

/// 队列统计信息
#[derive(Debug, Clone)]
pub struct QueueStats {
    pub pending_count: u32,
    pub running_count: u32,
    pub completed_count: u32,
    pub failed_count: u32,
}

// ==========================================
// PromotionQueue - 晋升任务队列
// ==========================================

/// 晋升任务队列管理器
pub struct PromotionQueue {
    conn: Arc<Mutex<Connection>>,
    worker: Arc<PromotionWorker>,
}

impl PromotionQueue {
    /// 创建新的晋升队列管理器
    pub fn new(conn: Arc<Mutex<Connection>>, worker: Arc<PromotionWorker>) -> Self {
        Self { conn, worker }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 提交晋升任务到队列
    ///
    /// 同一教学班已有 PENDING/RUNNING 任务时复用该任务
    /// (每个满足条件的教学班一次派发恰好一个任务)。
    ///
    /// # 返回
    /// - Ok(task_id): 新任务或已存在任务的 ID
    pub fn enqueue(&self, task: PromotionTask) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        let existing: Option<String> = conn
            .query_row(
                "SELECT task_id FROM promotion_queue
                 WHERE section_id = ?1 AND status IN ('PENDING', 'RUNNING')
                 LIMIT 1",
                params![task.section_id],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(task_id) = existing {
            tracing::debug!(
                "教学班已有待执行晋升任务, 复用: section_id={}, task_id={}",
                task.section_id,
                task_id
            );
            return Ok(task_id);
        }

        conn.execute(
            r#"
            INSERT INTO promotion_queue (
                task_id, section_id, trigger_type, trigger_source,
                status, retry_count, max_retries, promoted_count, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                task.task_id,
                task.section_id,
                task.trigger.as_str(),
                task.trigger_source,
                task.status.as_str(),
                task.retry_count,
                task.max_retries,
                task.promoted_count,
                task.created_at,
            ],
        )?;

        tracing::info!(
            "晋升任务已加入队列: task_id={}, section_id={}, trigger={}",
            task.task_id,
            task.section_id,
            task.trigger.as_str()
        );

        Ok(task.task_id)
    }

    /// 获取下一个待执行任务并标记为 RUNNING
    pub fn dequeue(&self) -> RepositoryResult<Option<PromotionTask>> {
        let conn = self.get_conn()?;

        let task_opt = conn
            .query_row(
                &format!("{} WHERE status = 'PENDING' ORDER BY created_at ASC LIMIT 1", SELECT_TASK),
                [],
                map_task,
            )
            .optional()?;

        if let Some(task) = task_opt {
            conn.execute(
                "UPDATE promotion_queue SET status = 'RUNNING', started_at = ?1 WHERE task_id = ?2",
                params![Utc::now().to_rfc3339(), task.task_id],
            )?;
            Ok(Some(task))
        } else {
            Ok(None)
        }
    }

    /// 执行晋升任务
    ///
    /// 瞬时故障按 max_retries 重试; 教学班不存在视为永久失败,
    /// 任务直接置 FAILED 并留下错误信息(不静默丢弃)。
    pub fn execute_task(&self, mut task: PromotionTask) -> RepositoryResult<usize> {
        tracing::info!(
            "开始执行晋升任务: task_id={}, section_id={}",
            task.task_id,
            task.section_id
        );

        match self.worker.execute(&task.section_id) {
            Ok(outcome) => {
                task.status = PromotionTaskStatus::Completed;
                task.completed_at = Some(Utc::now().to_rfc3339());
                task.promoted_count = outcome.promoted.len() as i32;

                let conn = self.get_conn()?;
                conn.execute(
                    "UPDATE promotion_queue
                     SET status = 'COMPLETED', completed_at = ?1, promoted_count = ?2
                     WHERE task_id = ?3",
                    params![task.completed_at, task.promoted_count, task.task_id],
                )?;

                tracing::info!(
                    "晋升任务执行成功: task_id={}, promoted={}, skipped={}",
                    task.task_id,
                    outcome.promoted.len(),
                    outcome.skipped.len()
                );

                Ok(outcome.promoted.len())
            }
            Err(e) => {
                let permanent = matches!(e, RepositoryError::NotFound { .. });
                task.error_message = Some(e.to_string());
                task.retry_count += 1;

                let conn = self.get_conn()?;
                if !permanent && task.retry_count <= task.max_retries {
                    conn.execute(
                        "UPDATE promotion_queue
                         SET status = 'PENDING', error_message = ?1, retry_count = ?2
                         WHERE task_id = ?3",
                        params![task.error_message, task.retry_count, task.task_id],
                    )?;
                    tracing::info!(
                        "晋升任务将重试: task_id={}, retry_count={}",
                        task.task_id,
                        task.retry_count
                    );
                } else {
                    conn.execute(
                        "UPDATE promotion_queue
                         SET status = 'FAILED', error_message = ?1, retry_count = ?2
                         WHERE task_id = ?3",
                        params![task.error_message, task.retry_count, task.task_id],
                    )?;
                    tracing::error!(
                        "晋升任务永久失败: task_id={}, section_id={}, permanent={}, error={}",
                        task.task_id,
                        task.section_id,
                        permanent,
                        e
                    );
                }

                Err(e)
            }
        }
    }

    /// 处理队列中的下一个任务
    ///
    /// # 返回
    /// - Ok(Some(promoted)): 执行了一个任务, 晋升 promoted 人
    /// - Ok(None): 队列为空
    pub fn process_next(&self) -> RepositoryResult<Option<usize>> {
        if let Some(task) = self.dequeue()? {
            match self.execute_task(task) {
                Ok(promoted) => Ok(Some(promoted)),
                Err(e) => Err(e),
            }
        } else {
            Ok(None)
        }
    }

    /// 处理队列中所有待执行任务
    ///
    /// # 返回
    /// - Ok(total_promoted): 本轮累计晋升人数
    pub fn process_all(&self) -> RepositoryResult<usize> {
        let mut total_promoted = 0;

        loop {
            match self.process_next() {
                Ok(Some(promoted)) => {
                    total_promoted += promoted;
                }
                Ok(None) => break,
                Err(e) => {
                    // 单个任务失败不阻塞队列, 继续处理下一个
                    tracing::error!("处理晋升任务失败: {}", e);
                }
            }
        }

        Ok(total_promoted)
    }

    /// 获取任务状态
    pub fn get_task(&self, task_id: &str) -> RepositoryResult<Option<PromotionTask>> {
        let conn = self.get_conn()?;
        let task = conn
            .query_row(
                &format!("{} WHERE task_id = ?1", SELECT_TASK),
                params![task_id],
                map_task,
            )
            .optional()?;
        Ok(task)
    }

    /// 取消待执行任务
    pub fn cancel_task(&self, task_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let rows_affected = conn.execute(
            "UPDATE promotion_queue SET status = 'CANCELLED' WHERE task_id = ?1 AND status = 'PENDING'",
            params![task_id],
        )?;
        Ok(rows_affected > 0)
    }

    /// 获取队列统计信息
    pub fn stats(&self) -> RepositoryResult<QueueStats> {
        let conn = self.get_conn()?;

        let mut counts = [0u32; 4];
        for (i, status) in ["PENDING", "RUNNING", "COMPLETED", "FAILED"].iter().enumerate() {
            counts[i] = conn.query_row(
                "SELECT COUNT(*) FROM promotion_queue WHERE status = ?1",
                params![status],
                |row| row.get::<_, i64>(0),
            )? as u32;
        }

        Ok(QueueStats {
            pending_count: counts[0],
            running_count: counts[1],
            completed_count: counts[2],
            failed_count: counts[3],
        })
    }
}

// ===== 行映射 =====

const SELECT_TASK: &str = r#"
    SELECT task_id, section_id, trigger_type, trigger_source, status,
           retry_count, max_retries, promoted_count,
           created_at, started_at, completed_at, error_message
    FROM promotion_queue
"#;

fn map_task(row: &Row<'_>) -> rusqlite::Result<PromotionTask> {
    let trigger: String = row.get(2)?;
    let status: String = row.get(4)?;
    Ok(PromotionTask {
        task_id: row.get(0)?,
        section_id: row.get(1)?,
        trigger: PromotionTrigger::from_str(&trigger),
        trigger_source: row.get(3)?,
        status: PromotionTaskStatus::from_str(&status),
        retry_count: row.get(5)?,
        max_retries: row.get(6)?,
        promoted_count: row.get(7)?,
        created_at: row.get(8)?,
        started_at: row.get(9)?,
        completed_at: row.get(10)?,
        error_message: row.get(11)?,
    })
}
