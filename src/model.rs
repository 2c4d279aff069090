use std::fmt;

/// Lifecycle of a [`WorkerPool`](crate::pool::WorkerPool).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolState {
    Initial,
    Running,
    Stopping,
    Stopped,
}

impl fmt::Display for PoolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PoolState::Initial => "initial",
            PoolState::Running => "running",
            PoolState::Stopping => "stopping",
            PoolState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct PoolMetrics {
    pub workers: usize,
    pub active_tasks: usize,
    pub queued_tasks: usize,
    pub queue_capacity: usize,
    pub total_submitted: usize,
    pub completed_tasks: usize,
    pub failed_tasks: usize,
    pub cancelled_tasks: usize,
    pub rejected_submissions: usize,
    pub discarded_tasks: usize,
}

impl PoolMetrics {
    pub fn idle_workers(&self) -> usize {
        self.workers.saturating_sub(self.active_tasks)
    }

    pub fn utilization(&self) -> f64 {
        if self.workers == 0 {
            return 0.0;
        }
        self.active_tasks as f64 / self.workers as f64
    }

    /// Fraction of the bounded queue currently occupied.
    pub fn queue_pressure(&self) -> f64 {
        if self.queue_capacity == 0 {
            return 0.0;
        }
        self.queued_tasks as f64 / self.queue_capacity as f64
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.completed_tasks + self.failed_tasks;
        if total == 0 {
            return 1.0;
        }
        self.completed_tasks as f64 / total as f64
    }
}

/// Order in which [`join_handles`](crate::handle::join_handles) yields results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOrdering {
    Ordered,
    UnOrdered,
}
