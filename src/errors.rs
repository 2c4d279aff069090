use std::io;

/// Synchronous failures of pool operations, reported straight to the caller.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("worker pool is not running")]
    NotRunning,

    #[error("worker pool is stopping")]
    Stopping,

    #[error("queue is full")]
    QueueFull,

    #[error("worker count must be positive, got {0}")]
    InvalidWorkerCount(usize),

    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] io::Error),
}

/// Deferred failures, observed only by whoever reads the task's handle.
#[derive(Debug, PartialEq, Eq, Clone, thiserror::Error)]
pub enum TaskError {
    #[error("task failed: {0}")]
    Failed(String),

    #[error("task panicked: {0}")]
    Panic(String),

    #[error("task was cancelled before it started")]
    Cancelled,

    /// The task was discarded by `stop()` before any worker dequeued it.
    #[error("task was dropped without running")]
    Abandoned,

    #[error("timed out waiting for task result")]
    Timeout,
}
