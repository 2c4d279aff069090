use super::{
    bounded::{BoundedQueue, PushError},
    errors::{PoolError, TaskError},
    handle::{ResultHandle, Task},
    model::{PoolMetrics, PoolState},
    queue::lock,
    result::{PoolResult, TaskResult},
};
use std::{
    any::Any,
    collections::VecDeque,
    fmt::Display,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    thread::{self, JoinHandle},
    time::Duration,
};
use crossbeam::utils::CachePadded;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};


pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

pub const DEFAULT_SUBMIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Конфигурация пула потоков
#[derive(Debug, Clone)]
pub struct Config {
    pub num_workers: usize,
    pub queue_capacity: usize,
    /// How long `submit` waits for a free slot before failing with `QueueFull`.
    pub submit_timeout: Duration,
    pub thread_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_workers: num_cpus::get(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            submit_timeout: DEFAULT_SUBMIT_TIMEOUT,
            thread_name: "worker-pool".to_string(),
        }
    }
}

impl Config {
    pub fn cpu_bound() -> Self {
        Self::default()
    }

    pub fn io_bound() -> Self {
        let num_cpus = num_cpus::get();
        Self {
            num_workers: num_cpus * 2, // Для I/O-bound задач
            queue_capacity: DEFAULT_QUEUE_CAPACITY * 4,
            ..Default::default()
        }
    }

    /// Zero is kept as is; `WorkerPool::start` rejects it.
    pub fn with_num_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    pub fn with_submit_timeout(mut self, timeout: Duration) -> Self {
        self.submit_timeout = timeout;
        self
    }

    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }
}


#[derive(Default)]
struct Counters {
    workers: CachePadded<AtomicUsize>,
    active: CachePadded<AtomicUsize>,
    submitted: CachePadded<AtomicUsize>,
    completed: CachePadded<AtomicUsize>,
    failed: CachePadded<AtomicUsize>,
    cancelled: CachePadded<AtomicUsize>,
    rejected: CachePadded<AtomicUsize>,
    discarded: CachePadded<AtomicUsize>,
}

#[derive(Default)]
struct Workers {
    running: Vec<JoinHandle<()>>,
    // Workers that stopped their own pool from inside a task; joined on the next shutdown.
    retired: Vec<JoinHandle<()>>,
}

struct Shared {
    queue: BoundedQueue<VecDeque<Task>>,
    state: Mutex<PoolState>,
    counters: Arc<Counters>,
}

/// Пул потоков фиксированного размера с ограниченной очередью задач
///
/// Submitters are held back (up to `Config::submit_timeout`) while the queue is
/// full. `stop()` lets tasks already picked up by a worker finish and discards
/// everything still queued; the handles of discarded tasks resolve to
/// [`TaskError::Abandoned`].
pub struct WorkerPool {
    shared: Arc<Shared>,
    // Held for the whole start/stop transition.
    workers: Mutex<Workers>,
    config: Config,
}

impl WorkerPool {
    /// Creates a pool in the `Initial` state; call [`start`](Self::start) to spawn workers.
    pub fn new(queue_capacity: usize) -> Self {
        Self::with_config(Config::default().with_queue_capacity(queue_capacity))
    }

    pub fn with_config(config: Config) -> Self {
        let shared = Arc::new(Shared {
            queue: BoundedQueue::new(config.queue_capacity),
            state: Mutex::new(PoolState::Initial),
            counters: Arc::new(Counters::default()),
        });

        Self {
            shared,
            workers: Mutex::new(Workers::default()),
            config,
        }
    }

    /// Creates a pool and starts `config.num_workers` workers.
    pub fn launch(config: Config) -> PoolResult<Self> {
        let num_workers = config.num_workers;
        let pool = Self::with_config(config);
        pool.start(num_workers)?;
        Ok(pool)
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn state(&self) -> PoolState {
        *lock(&self.shared.state)
    }

    fn set_state(&self, next: PoolState) {
        let mut state = lock(&self.shared.state);
        let prev = std::mem::replace(&mut *state, next);
        debug!(from = %prev, to = %next, "pool state transition");
    }

    /// Spawns `num_workers` threads. A no-op if the pool is already running.
    #[instrument(skip(self), fields(pool = %self.config.thread_name))]
    pub fn start(&self, num_workers: usize) -> PoolResult<()> {
        if num_workers == 0 {
            return Err(PoolError::InvalidWorkerCount(num_workers));
        }

        let mut workers = lock(&self.workers);
        if self.state() == PoolState::Running {
            debug!("worker pool is already running");
            return Ok(());
        }

        let generation = self.shared.queue.reopen();
        self.set_state(PoolState::Running);

        for id in 0..num_workers {
            let shared = Arc::clone(&self.shared);
            let spawned = thread::Builder::new()
                .name(format!("{}-{}", self.config.thread_name, id))
                .spawn(move || worker_loop(shared, id, generation));

            match spawned {
                Ok(handle) => workers.running.push(handle),
                Err(err) => {
                    warn!(error = %err, worker = id, "failed to spawn worker, rolling back");
                    self.shutdown(&mut workers);
                    return Err(PoolError::Spawn(err));
                }
            }
        }
        self.shared.counters.workers.store(workers.running.len(), Ordering::Relaxed);

        info!(
            workers = num_workers,
            generation,
            capacity = self.shared.queue.capacity(),
            "worker pool started"
        );
        Ok(())
    }

    /// Blocks until every worker has exited. Idempotent.
    ///
    /// Tasks already running finish; tasks still queued are discarded.
    #[instrument(skip(self), fields(pool = %self.config.thread_name))]
    pub fn stop(&self) {
        let mut workers = lock(&self.workers);
        if self.state() != PoolState::Running {
            return;
        }
        self.shutdown(&mut workers);
    }

    fn shutdown(&self, workers: &mut Workers) {
        info!(workers = workers.running.len(), "stopping worker pool");

        // Closing before publishing `Stopping` guarantees no dequeue happens once
        // the state is observable.
        self.shared.queue.close();
        self.set_state(PoolState::Stopping);

        let current = thread::current().id();
        let mut handles: Vec<_> = workers.retired.drain(..).collect();
        handles.append(&mut workers.running);
        for handle in handles {
            // A task stopping its own pool: its worker is bound to this generation
            // and leaves once the task returns.
            if handle.thread().id() == current {
                workers.retired.push(handle);
                continue;
            }
            if handle.join().is_err() {
                warn!("worker thread terminated abnormally");
            }
        }
        self.shared.counters.workers.store(0, Ordering::Relaxed);

        let discarded = self.shared.queue.clear();
        self.shared.counters.discarded.fetch_add(discarded, Ordering::Relaxed);
        self.set_state(PoolState::Stopped);

        info!(discarded, "worker pool stopped");
    }

    pub fn submit<T, F>(&self, f: F) -> PoolResult<ResultHandle<T>>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        self.enqueue(move || Ok(f()))
    }

    /// Submits `f` with `arg` bound as its argument.
    pub fn submit_with<A, T, F>(&self, f: F, arg: A) -> PoolResult<ResultHandle<T>>
    where
        A: Send + 'static,
        T: Send + 'static,
        F: FnOnce(A) -> T + Send + 'static,
    {
        self.enqueue(move || Ok(f(arg)))
    }

    /// An `Err` returned by `f` surfaces as [`TaskError::Failed`] on the handle.
    pub fn submit_fallible<T, E, F>(&self, f: F) -> PoolResult<ResultHandle<T>>
    where
        T: Send + 'static,
        E: Display,
        F: FnOnce() -> Result<T, E> + Send + 'static,
    {
        self.enqueue(move || f().map_err(|e| TaskError::Failed(e.to_string())))
    }

    fn enqueue<T, F>(&self, f: F) -> PoolResult<ResultHandle<T>>
    where
        T: Send + 'static,
        F: FnOnce() -> TaskResult<T> + Send + 'static,
    {
        match self.state() {
            PoolState::Running => {}
            PoolState::Stopping => return Err(PoolError::Stopping),
            PoolState::Initial | PoolState::Stopped => return Err(PoolError::NotRunning),
        }

        let (tx, rx) = oneshot::channel::<TaskResult<T>>();
        let cancel_token = CancellationToken::new();
        let task = wrap_task(f, tx, cancel_token.clone(), Arc::clone(&self.shared.counters));

        let counters = &self.shared.counters;
        match self.shared.queue.push_timeout(task, self.config.submit_timeout) {
            Ok(()) => {
                counters.submitted.fetch_add(1, Ordering::Relaxed);
                Ok(ResultHandle::new(cancel_token, rx))
            }
            Err(PushError::Full(_)) => {
                counters.rejected.fetch_add(1, Ordering::Relaxed);
                warn!(
                    timeout = ?self.config.submit_timeout,
                    capacity = self.shared.queue.capacity(),
                    "task queue is full, rejecting submission"
                );
                Err(PoolError::QueueFull)
            }
            Err(PushError::Closed(_)) => {
                counters.rejected.fetch_add(1, Ordering::Relaxed);
                match self.state() {
                    PoolState::Initial | PoolState::Stopped => Err(PoolError::NotRunning),
                    PoolState::Running | PoolState::Stopping => Err(PoolError::Stopping),
                }
            }
        }
    }

    #[inline]
    pub fn metrics(&self) -> PoolMetrics {
        let c = &self.shared.counters;
        PoolMetrics {
            workers: c.workers.load(Ordering::Relaxed),
            active_tasks: c.active.load(Ordering::Relaxed),
            queued_tasks: self.shared.queue.len(),
            queue_capacity: self.shared.queue.capacity(),
            total_submitted: c.submitted.load(Ordering::Relaxed),
            completed_tasks: c.completed.load(Ordering::Relaxed),
            failed_tasks: c.failed.load(Ordering::Relaxed),
            cancelled_tasks: c.cancelled.load(Ordering::Relaxed),
            rejected_submissions: c.rejected.load(Ordering::Relaxed),
            discarded_tasks: c.discarded.load(Ordering::Relaxed),
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.stop();

        let current = thread::current().id();
        let retired = std::mem::take(&mut lock(&self.workers).retired);
        for handle in retired {
            if handle.thread().id() != current && handle.join().is_err() {
                warn!("worker thread terminated abnormally");
            }
        }
    }
}

fn worker_loop(shared: Arc<Shared>, id: usize, generation: u64) {
    debug!(worker = id, generation, "worker started");
    while let Some(task) = shared.queue.pop_generation(generation) {
        task();
    }
    debug!(worker = id, generation, "worker exited");
}

fn wrap_task<T, F>(
    f: F,
    tx: oneshot::Sender<TaskResult<T>>,
    cancel_token: CancellationToken,
    counters: Arc<Counters>,
) -> Task
where
    T: Send + 'static,
    F: FnOnce() -> TaskResult<T> + Send + 'static,
{
    Box::new(move || {
        if cancel_token.is_cancelled() {
            counters.cancelled.fetch_add(1, Ordering::Relaxed);
            let _ = tx.send(Err(TaskError::Cancelled));
            return;
        }

        counters.active.fetch_add(1, Ordering::Relaxed);
        let result = panic::catch_unwind(AssertUnwindSafe(f))
            .unwrap_or_else(|payload| Err(TaskError::Panic(panic_message(&*payload))));
        counters.active.fetch_sub(1, Ordering::Relaxed);

        match &result {
            Ok(_) => {
                counters.completed.fetch_add(1, Ordering::Relaxed);
            }
            Err(err) => {
                counters.failed.fetch_add(1, Ordering::Relaxed);
                if let TaskError::Panic(msg) = err {
                    warn!(panic = %msg, "task panicked");
                }
            }
        }

        // The caller may have dropped its handle; that is not an error.
        let _ = tx.send(result);
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
