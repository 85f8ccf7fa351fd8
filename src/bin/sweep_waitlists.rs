// Small ops utility: run one waitlist sweep pass and drain the promotion queue.
//
// Usage:
//   cargo run --bin sweep-waitlists -- [db_path]            # one-shot (cron-friendly)
//   cargo run --bin sweep-waitlists -- [db_path] --watch    # scheduled loop
//
// Used both as a cron-style failsafe and as an operator-invoked diagnostic.
// --watch reads the interval from config (promotion/sweep_interval_secs).

use sis_registration::api::RegistrationApi;
use sis_registration::config::{RegistrationConfigManager, RegistrationConfigReader};
use sis_registration::db::{default_db_path, open_sqlite_connection};
use std::sync::{Arc, Mutex};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    sis_registration::logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let watch = args.iter().any(|a| a == "--watch");
    let db_path = args
        .iter()
        .find(|a| !a.starts_with("--"))
        .cloned()
        .unwrap_or_else(default_db_path);
    tracing::info!("使用数据库: {}", db_path);

    let conn = Arc::new(Mutex::new(open_sqlite_connection(&db_path)?));
    let api = RegistrationApi::with_default_stack(conn.clone());

    let report = api.check_waitlists_now()?;
    let stats = api.queue_stats()?;

    println!(
        "dispatched_tasks={} promoted_students={}",
        report.dispatched_tasks, report.promoted_students
    );
    println!(
        "queue: pending={} running={} completed={} failed={}",
        stats.pending_count, stats.running_count, stats.completed_count, stats.failed_count
    );

    if watch {
        let config = RegistrationConfigManager::from_connection(conn)?;
        let interval_secs = config.get_sweep_interval_secs().await?;
        tracing::info!("进入定时扫描模式: interval={}s", interval_secs);
        api.run_scheduled(interval_secs).await;
    }

    Ok(())
}
