// ==========================================
// 高校选课系统 - 候补扫描器
// ==========================================
// 依据: 选课引擎设计说明 - 候补扫描 / 并发模型
// 职责: 找出"有空位且有人候补"的教学班, 每班派发一个晋升任务
// 说明: 只检测与派发, 不直接晋升; 定时扫描与退选触发
//       共用同一条检测-派发代码路径, 只是触发类型不同
// 红线: 全进程同一时刻至多一次扫描在执行(单飞保护)
// ==========================================

use crate::engine::promotion_queue::{PromotionQueue, PromotionTask, PromotionTrigger};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::instrument;

/// 扫描命中的教学班
#[derive(Debug, Clone)]
struct SweepCandidate {
    section_id: String,
    capacity: i64,
    enrolled_count: i64,
    waitlisted_count: i64,
}

/// 候补扫描器
pub struct WaitlistSweeper {
    conn: Arc<Mutex<Connection>>,
    queue: Arc<PromotionQueue>,
    /// 派发任务的最大重试次数
    max_retries: i32,
    /// 扫描单飞保护: 上一轮未结束时跳过本轮
    sweep_guard: Mutex<()>,
}

impl WaitlistSweeper {
    pub fn new(conn: Arc<Mutex<Connection>>, queue: Arc<PromotionQueue>) -> Self {
        Self {
            conn,
            queue,
            max_retries: 3,
            sweep_guard: Mutex::new(()),
        }
    }

    pub fn with_max_retries(mut self, max_retries: i32) -> Self {
        self.max_retries = max_retries;
        self
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 全量扫描
    // ==========================================

    /// 执行一轮扫描, 为每个命中的教学班派发一个晋升任务
    ///
    /// # 参数
    /// - trigger: 触发类型(定时/手动)
    /// - trigger_source: 触发源描述
    ///
    /// # 返回
    /// - Ok(dispatched): 本轮派发的任务数
    ///
    /// # 单飞
    /// 上一轮扫描未结束时直接返回 0, 不排队等待。
    #[instrument(skip(self))]
    pub fn sweep_once(
        &self,
        trigger: PromotionTrigger,
        trigger_source: Option<String>,
    ) -> RepositoryResult<usize> {
        let Ok(_guard) = self.sweep_guard.try_lock() else {
            tracing::warn!("已有扫描在执行, 跳过本轮");
            return Ok(0);
        };

        let candidates = self.scan_candidates()?;
        let total = candidates.len();
        let mut dispatched = 0;

        for candidate in candidates {
            if self
                .dispatch(&candidate, trigger, trigger_source.clone())?
                .is_some()
            {
                dispatched += 1;
            }
        }

        tracing::info!(
            "候补扫描完成: 命中教学班 {} 个, 派发任务 {} 个, trigger={}",
            total,
            dispatched,
            trigger.as_str()
        );

        Ok(dispatched)
    }

    // ==========================================
    // 单教学班派发(退选触发的同步路径)
    // ==========================================

    /// 检查单个教学班并派发晋升任务(条件不满足则不派发)
    ///
    /// 与 sweep_once 共用同一条检测-派发逻辑;
    /// 退选释放名额后由调用方立即调用, 定时扫描是漏事件的兜底。
    #[instrument(skip(self), fields(section_id = %section_id))]
    pub fn dispatch_for_section(
        &self,
        section_id: &str,
        trigger: PromotionTrigger,
        trigger_source: Option<String>,
    ) -> RepositoryResult<Option<String>> {
        let Some(candidate) = self.load_candidate(section_id)? else {
            return Ok(None);
        };
        self.dispatch(&candidate, trigger, trigger_source)
    }

    // ==========================================
    // 定时循环
    // ==========================================

    /// 定时扫描循环(兜底失效安全网)
    ///
    /// 每个周期: 一轮扫描 + 清空任务队列。
    /// 进程关闭时随任务一起取消。
    pub async fn run_scheduled(&self, interval_secs: u64) {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            interval.tick().await;

            match self.sweep_once(PromotionTrigger::ScheduledSweep, Some("scheduler".to_string())) {
                Ok(dispatched) => {
                    if dispatched > 0 {
                        if let Err(e) = self.queue.process_all() {
                            tracing::error!("定时扫描处理任务队列失败: {}", e);
                        }
                    }
                }
                Err(e) => tracing::error!("定时扫描失败: {}", e),
            }
        }
    }

    // ==========================================
    // 内部实现
    // ==========================================

    /// 扫描全部命中条件的教学班:
    /// 开课状态 + enrolled < capacity + 至少一人候补
    fn scan_candidates(&self) -> RepositoryResult<Vec<SweepCandidate>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT s.section_id, s.capacity,
                   COUNT(CASE WHEN e.status = 'ENROLLED' THEN 1 END) AS enrolled_cnt,
                   COUNT(CASE WHEN e.status = 'WAITLISTED' THEN 1 END) AS waitlisted_cnt
            FROM course_section s
            LEFT JOIN enrollment e ON e.section_id = s.section_id
            WHERE s.status = 'OPEN'
            GROUP BY s.section_id, s.capacity
            HAVING enrolled_cnt < s.capacity AND waitlisted_cnt > 0
            ORDER BY s.section_id
            "#,
        )?;
        let rows = stmt.query_map([], map_candidate)?;
        let mut candidates = Vec::new();
        for row in rows {
            candidates.push(row?);
        }
        Ok(candidates)
    }

    /// 加载单个教学班的扫描视图(不满足条件返回 None)
    fn load_candidate(&self, section_id: &str) -> RepositoryResult<Option<SweepCandidate>> {
        let conn = self.get_conn()?;
        let candidate = conn
            .query_row(
                r#"
                SELECT s.section_id, s.capacity,
                       COUNT(CASE WHEN e.status = 'ENROLLED' THEN 1 END) AS enrolled_cnt,
                       COUNT(CASE WHEN e.status = 'WAITLISTED' THEN 1 END) AS waitlisted_cnt
                FROM course_section s
                LEFT JOIN enrollment e ON e.section_id = s.section_id
                WHERE s.section_id = ?1 AND s.status = 'OPEN'
                GROUP BY s.section_id, s.capacity
                HAVING enrolled_cnt < s.capacity AND waitlisted_cnt > 0
                "#,
                params![section_id],
                map_candidate,
            )
            .optional()?;
        Ok(candidate)
    }

    /// 为命中的教学班派发任务(队列内部按教学班去重)
    fn dispatch(
        &self,
        candidate: &SweepCandidate,
        trigger: PromotionTrigger,
        trigger_source: Option<String>,
    ) -> RepositoryResult<Option<String>> {
        tracing::info!(
            "派发晋升任务: section_id={}, enrolled={}/{}, waitlist_size={}",
            candidate.section_id,
            candidate.enrolled_count,
            candidate.capacity,
            candidate.waitlisted_count
        );

        let task = PromotionTask::new(
            &candidate.section_id,
            trigger,
            trigger_source,
            self.max_retries,
        );
        let task_id = self.queue.enqueue(task)?;
        Ok(Some(task_id))
    }
}

// ===== 行映射 =====

fn map_candidate(row: &Row<'_>) -> rusqlite::Result<SweepCandidate> {
    Ok(SweepCandidate {
        section_id: row.get(0)?,
        capacity: row.get(1)?,
        enrolled_count: row.get(2)?,
        waitlisted_count: row.get(3)?,
    })
}
