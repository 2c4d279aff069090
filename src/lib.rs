//! Пул рабочих потоков с ограниченной очередью задач
//!
//! # Features
//! - Потокобезопасные очереди: FIFO и приоритетная (`ConcurrentQueue`, `ConcurrentPriorityQueue`)
//! - Ограниченная очередь пула с backpressure и таймаутом на submit
//! - Жизненный цикл Initial → Running → Stopping → Stopped с повторным запуском
//! - Результаты задач через `ResultHandle` (blocking `get()` или `.await`)
//! - Перехват паник и ошибок задач, отмена ещё не начатых задач
//! - Метрики пула

pub mod bounded;
pub mod errors;
pub mod handle;
pub mod model;
pub mod pool;
pub mod queue;
pub mod result;

pub use bounded::{BoundedQueue, PushError};
pub use errors::{PoolError, TaskError};
pub use handle::{join_handles, ResultHandle};
pub use model::{JoinOrdering, PoolMetrics, PoolState};
pub use pool::{Config, WorkerPool};
pub use queue::{ConcurrentPriorityQueue, ConcurrentQueue, MaxFirst, MinFirst};
pub use result::{PoolResult, TaskResult};
