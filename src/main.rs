use worker_pool::{Config, PoolError, WorkerPool};
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;


fn main() -> Result<(), PoolError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::cpu_bound()
        .with_queue_capacity(256)
        .with_submit_timeout(Duration::from_secs(1));
    let pool = WorkerPool::launch(config)?;

    let now = Instant::now();
    let mut handles = Vec::with_capacity(10_000);
    for i in 0..10_000u64 {
        handles.push(pool.submit_with(|x: u64| x * 2, i)?);
    }

    let mut sum = 0u64;
    for handle in handles {
        match handle.get() {
            Ok(v) => sum += v,
            Err(e) => warn!(error = %e, "task failed"),
        }
    }

    pool.stop();
    let metrics = pool.metrics();
    info!(
        sum,
        completed = metrics.completed_tasks,
        elapsed = ?now.elapsed(),
        "done"
    );
    Ok(())
}
