//! Bounded queue feeding the worker pool.
//!
//! Unlike [`SyncQueue`](crate::queue::SyncQueue) this one distinguishes
//! "became non-empty" (wakes workers) from "became non-full" (wakes
//! submitters held back by backpressure), and can be closed so that both
//! sides stop waiting. Every `reopen` starts a new generation; consumers bound
//! to an older generation are refused even though the queue is open again.

use super::queue::{lock, Buffer};
use std::{
    fmt,
    sync::{Condvar, Mutex, PoisonError},
    time::Duration,
};

/// A rejected push. The item is handed back to the caller.
pub enum PushError<T> {
    Full(T),
    Closed(T),
}

impl<T> PushError<T> {
    pub fn into_inner(self) -> T {
        match self {
            PushError::Full(item) | PushError::Closed(item) => item,
        }
    }
}

impl<T> fmt::Debug for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PushError::Full(_) => f.write_str("Full(..)"),
            PushError::Closed(_) => f.write_str("Closed(..)"),
        }
    }
}

struct State<B> {
    items: B,
    closed: bool,
    generation: u64,
}

pub struct BoundedQueue<B: Buffer> {
    state: Mutex<State<B>>,
    capacity: usize,
    not_empty: Condvar,
    not_full: Condvar,
}

impl<B: Buffer> BoundedQueue<B> {
    /// `capacity` is clamped to at least one slot.
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(State {
                items: B::default(),
                closed: false,
                generation: 0,
            }),
            capacity: capacity.max(1),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn try_push(&self, item: B::Item) -> Result<(), PushError<B::Item>> {
        let mut state = lock(&self.state);
        if state.closed {
            return Err(PushError::Closed(item));
        }
        if state.items.len() >= self.capacity {
            return Err(PushError::Full(item));
        }
        state.items.put(item);
        drop(state);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Waits up to `timeout` for a free slot.
    pub fn push_timeout(&self, item: B::Item, timeout: Duration) -> Result<(), PushError<B::Item>> {
        let capacity = self.capacity;
        let (mut state, _) = self
            .not_full
            .wait_timeout_while(lock(&self.state), timeout, |s| {
                !s.closed && s.items.len() >= capacity
            })
            .unwrap_or_else(PoisonError::into_inner);

        if state.closed {
            return Err(PushError::Closed(item));
        }
        if state.items.len() >= capacity {
            return Err(PushError::Full(item));
        }
        state.items.put(item);
        drop(state);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Blocks until an item is available or the queue is closed.
    ///
    /// Returns `None` once closed, even if items are still buffered.
    pub fn pop(&self) -> Option<B::Item> {
        self.pop_in(None)
    }

    /// Like [`pop`](Self::pop), but also returns `None` as soon as the queue has
    /// been reopened past `generation`.
    pub fn pop_generation(&self, generation: u64) -> Option<B::Item> {
        self.pop_in(Some(generation))
    }

    fn pop_in(&self, generation: Option<u64>) -> Option<B::Item> {
        let state = lock(&self.state);
        let generation = generation.unwrap_or(state.generation);
        let mut state = self
            .not_empty
            .wait_while(state, |s| {
                !s.closed && s.generation == generation && s.items.is_empty()
            })
            .unwrap_or_else(PoisonError::into_inner);

        if state.closed || state.generation != generation {
            return None;
        }
        let item = state.items.take();
        drop(state);
        if item.is_some() {
            self.not_full.notify_one();
        }
        item
    }

    pub fn try_pop(&self) -> Option<B::Item> {
        let mut state = lock(&self.state);
        if state.closed {
            return None;
        }
        let item = state.items.take();
        drop(state);
        if item.is_some() {
            self.not_full.notify_one();
        }
        item
    }

    /// Refuses further pushes and pops and wakes every waiter.
    pub fn close(&self) {
        lock(&self.state).closed = true;
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    /// Accepts pushes and pops again and returns the new generation.
    pub fn reopen(&self) -> u64 {
        let mut state = lock(&self.state);
        state.closed = false;
        state.generation += 1;
        let generation = state.generation;
        drop(state);
        // Stale consumers still parked on the old generation must leave.
        self.not_empty.notify_all();
        generation
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        lock(&self.state).generation
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        lock(&self.state).closed
    }

    /// Drops every buffered item outside the lock and returns the count.
    pub fn clear(&self) -> usize {
        let drained = std::mem::take(&mut lock(&self.state).items);
        self.not_full.notify_all();
        drained.len()
    }

    pub fn len(&self) -> usize {
        lock(&self.state).items.len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.state).items.is_empty()
    }
}
