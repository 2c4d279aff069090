//! Unbounded thread-safe queues.
//!
//! Both flavours share one shape: a buffer behind a mutex plus a condition
//! variable signalled whenever the buffer becomes non-empty. They differ only
//! in the [`Buffer`] discipline that decides which item pops next.

use std::{
    cmp::Ordering,
    collections::{BinaryHeap, VecDeque},
    marker::PhantomData,
    sync::{Condvar, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

/// Storage discipline behind a queue.
pub trait Buffer: Default {
    type Item;

    fn put(&mut self, item: Self::Item);
    fn take(&mut self) -> Option<Self::Item>;
    fn len(&self) -> usize;

    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Buffer for VecDeque<T> {
    type Item = T;

    #[inline]
    fn put(&mut self, item: T) {
        self.push_back(item);
    }

    #[inline]
    fn take(&mut self) -> Option<T> {
        self.pop_front()
    }

    #[inline]
    fn len(&self) -> usize {
        VecDeque::len(self)
    }
}

/// Ordering used by [`PriorityBuffer`]: the greater element pops first.
pub trait Comparator<T> {
    fn compare(a: &T, b: &T) -> Ordering;
}

/// Largest element first.
#[derive(Debug, Default, Clone, Copy)]
pub struct MaxFirst;

/// Smallest element first.
#[derive(Debug, Default, Clone, Copy)]
pub struct MinFirst;

impl<T: Ord> Comparator<T> for MaxFirst {
    #[inline]
    fn compare(a: &T, b: &T) -> Ordering {
        a.cmp(b)
    }
}

impl<T: Ord> Comparator<T> for MinFirst {
    #[inline]
    fn compare(a: &T, b: &T) -> Ordering {
        b.cmp(a)
    }
}

struct Ranked<T, C> {
    item: T,
    _cmp: PhantomData<fn() -> C>,
}

impl<T, C: Comparator<T>> PartialEq for Ranked<T, C> {
    fn eq(&self, other: &Self) -> bool {
        C::compare(&self.item, &other.item) == Ordering::Equal
    }
}

impl<T, C: Comparator<T>> Eq for Ranked<T, C> {}

impl<T, C: Comparator<T>> PartialOrd for Ranked<T, C> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T, C: Comparator<T>> Ord for Ranked<T, C> {
    fn cmp(&self, other: &Self) -> Ordering {
        C::compare(&self.item, &other.item)
    }
}

/// Binary heap ordered by `C`. Ties come out in heap order, not insertion order.
pub struct PriorityBuffer<T, C = MaxFirst> {
    heap: BinaryHeap<Ranked<T, C>>,
}

impl<T, C: Comparator<T>> Default for PriorityBuffer<T, C> {
    fn default() -> Self {
        Self { heap: BinaryHeap::new() }
    }
}

impl<T, C: Comparator<T>> Buffer for PriorityBuffer<T, C> {
    type Item = T;

    #[inline]
    fn put(&mut self, item: T) {
        self.heap.push(Ranked { item, _cmp: PhantomData });
    }

    #[inline]
    fn take(&mut self) -> Option<T> {
        self.heap.pop().map(|r| r.item)
    }

    #[inline]
    fn len(&self) -> usize {
        self.heap.len()
    }
}

#[inline]
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Unbounded blocking queue over any [`Buffer`].
pub struct SyncQueue<B: Buffer> {
    items: Mutex<B>,
    not_empty: Condvar,
}

pub type ConcurrentQueue<T> = SyncQueue<VecDeque<T>>;

pub type ConcurrentPriorityQueue<T, C = MaxFirst> = SyncQueue<PriorityBuffer<T, C>>;

impl<B: Buffer> Default for SyncQueue<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Buffer> SyncQueue<B> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(B::default()),
            not_empty: Condvar::new(),
        }
    }

    /// Never blocks, never fails.
    pub fn push(&self, item: B::Item) {
        lock(&self.items).put(item);
        self.not_empty.notify_one();
    }

    pub fn try_pop(&self) -> Option<B::Item> {
        lock(&self.items).take()
    }

    pub fn wait_pop(&self) -> B::Item {
        let mut items = lock(&self.items);
        loop {
            if let Some(item) = items.take() {
                return item;
            }
            items = self
                .not_empty
                .wait(items)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    pub fn wait_pop_for(&self, timeout: Duration) -> Option<B::Item> {
        let (mut items, _) = self
            .not_empty
            .wait_timeout_while(lock(&self.items), timeout, |items| items.is_empty())
            .unwrap_or_else(PoisonError::into_inner);
        items.take()
    }

    /// Drops every queued item and returns how many were discarded.
    pub fn clear(&self) -> usize {
        let drained = std::mem::take(&mut *lock(&self.items));
        drained.len()
    }

    pub fn len(&self) -> usize {
        lock(&self.items).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.items).is_empty()
    }
}
