#[cfg(test)]
mod tests {
    use worker_pool::{
        bounded::{BoundedQueue, PushError},
        queue::{Comparator, ConcurrentPriorityQueue, ConcurrentQueue, MinFirst},
    };
    use std::{
        cmp::Ordering,
        collections::VecDeque,
        sync::atomic::{AtomicUsize, Ordering as AtomicOrdering},
        time::{Duration, Instant},
    };

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Job {
        priority: u32,
        data: String,
    }

    impl Job {
        fn new(priority: u32, data: &str) -> Self {
            Self { priority, data: data.to_string() }
        }
    }

    impl PartialOrd for Job {
        fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
            Some(self.cmp(other))
        }
    }

    impl Ord for Job {
        fn cmp(&self, other: &Self) -> Ordering {
            self.priority.cmp(&other.priority)
        }
    }

    /// Shortest string first, whatever its content.
    struct ShortestFirst;

    impl Comparator<String> for ShortestFirst {
        fn compare(a: &String, b: &String) -> Ordering {
            b.len().cmp(&a.len())
        }
    }

    #[test]
    fn test_push_and_try_pop() {
        let queue = ConcurrentQueue::<i32>::new();
        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);

        queue.push(1);
        assert!(!queue.is_empty());
        assert_eq!(queue.len(), 1);

        assert_eq!(queue.try_pop(), Some(1));
        assert!(queue.is_empty());
        assert_eq!(queue.try_pop(), None);
    }

    #[test]
    fn test_fifo_order() {
        let queue = ConcurrentQueue::new();
        crossbeam::thread::scope(|s| {
            s.spawn(|_| {
                for i in 0..1_000 {
                    queue.push(i);
                }
            });

            let popped: Vec<i32> = (0..1_000).map(|_| queue.wait_pop()).collect();
            assert_eq!(popped, (0..1_000).collect::<Vec<_>>());
        })
        .unwrap();
        assert!(queue.is_empty());
    }

    #[test]
    fn test_wait_pop_blocks_until_push() {
        let queue = ConcurrentQueue::new();
        crossbeam::thread::scope(|s| {
            let consumer = s.spawn(|_| queue.wait_pop());
            std::thread::sleep(Duration::from_millis(50));
            queue.push("late");
            assert_eq!(consumer.join().unwrap(), "late");
        })
        .unwrap();
    }

    #[test]
    fn test_wait_pop_for() {
        let queue = ConcurrentQueue::new();
        queue.push(20);
        assert_eq!(queue.wait_pop_for(Duration::from_millis(100)), Some(20));

        let start = Instant::now();
        assert_eq!(queue.wait_pop_for(Duration::from_millis(30)), None);
        assert!(start.elapsed() >= Duration::from_millis(25));
    }

    #[test]
    fn test_clear() {
        let queue = ConcurrentQueue::new();
        queue.push(1);
        queue.push(2);
        assert_eq!(queue.len(), 2);

        assert_eq!(queue.clear(), 2);
        assert!(queue.is_empty());
        assert_eq!(queue.try_pop(), None);
    }

    #[test]
    fn test_multiple_producers_single_consumer() {
        println!("\n=== TEST: N producers / 1 consumer ===");
        const PRODUCERS: usize = 4;
        const PER_PRODUCER: usize = 500;

        let queue = ConcurrentQueue::new();
        let produced_sum = AtomicUsize::new(0);

        let consumed = crossbeam::thread::scope(|s| {
            for p in 0..PRODUCERS {
                let queue = &queue;
                let produced_sum = &produced_sum;
                s.spawn(move |_| {
                    for j in 0..PER_PRODUCER {
                        let v = p * PER_PRODUCER + j;
                        queue.push(v);
                        produced_sum.fetch_add(v, AtomicOrdering::Relaxed);
                    }
                });
            }

            let mut consumed = Vec::with_capacity(PRODUCERS * PER_PRODUCER);
            while consumed.len() < PRODUCERS * PER_PRODUCER {
                if let Some(v) = queue.wait_pop_for(Duration::from_millis(200)) {
                    consumed.push(v);
                }
            }
            consumed
        })
        .unwrap();

        assert_eq!(consumed.len(), PRODUCERS * PER_PRODUCER);
        assert_eq!(consumed.iter().sum::<usize>(), produced_sum.load(AtomicOrdering::Relaxed));

        let mut sorted = consumed;
        sorted.sort_unstable();
        assert_eq!(sorted, (0..PRODUCERS * PER_PRODUCER).collect::<Vec<_>>());
        assert!(queue.is_empty());
        println!("  ✓ consumed {} items", PRODUCERS * PER_PRODUCER);
    }

    #[test]
    fn test_single_producer_multiple_consumers() {
        const TOTAL: usize = 2_000;
        const CONSUMERS: usize = 4;

        let queue = ConcurrentQueue::new();
        let consumed_count = AtomicUsize::new(0);
        let consumed_sum = AtomicUsize::new(0);

        crossbeam::thread::scope(|s| {
            s.spawn(|_| {
                for i in 0..TOTAL {
                    queue.push(i);
                }
            });

            for _ in 0..CONSUMERS {
                s.spawn(|_| {
                    while consumed_count.load(AtomicOrdering::Acquire) < TOTAL {
                        if let Some(v) = queue.wait_pop_for(Duration::from_millis(20)) {
                            consumed_sum.fetch_add(v, AtomicOrdering::Relaxed);
                            consumed_count.fetch_add(1, AtomicOrdering::AcqRel);
                        }
                    }
                });
            }
        })
        .unwrap();

        assert_eq!(consumed_count.load(AtomicOrdering::Relaxed), TOTAL);
        assert_eq!(consumed_sum.load(AtomicOrdering::Relaxed), (0..TOTAL).sum::<usize>());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_priority_max_first() {
        let pq = ConcurrentPriorityQueue::<Job>::new();
        pq.push(Job::new(1, "low"));
        pq.push(Job::new(3, "high"));
        pq.push(Job::new(2, "mid"));
        assert_eq!(pq.len(), 3);

        let order: Vec<u32> = std::iter::from_fn(|| pq.try_pop()).map(|j| j.priority).collect();
        assert_eq!(order, vec![3, 2, 1]);
        assert!(pq.is_empty());
    }

    #[test]
    fn test_priority_min_first() {
        let pq = ConcurrentPriorityQueue::<Job, MinFirst>::new();
        pq.push(Job::new(1, "low"));
        pq.push(Job::new(3, "high"));
        pq.push(Job::new(2, "mid"));

        let first = pq.try_pop().unwrap();
        assert_eq!(first.priority, 1);
        assert_eq!(first.data, "low");
        assert_eq!(pq.wait_pop().priority, 2);
        assert_eq!(pq.wait_pop_for(Duration::from_millis(10)).map(|j| j.priority), Some(3));
        assert!(pq.is_empty());
    }

    #[test]
    fn test_priority_custom_comparator() {
        let pq = ConcurrentPriorityQueue::<String, ShortestFirst>::new();
        for word in ["elephant", "ox", "cat", "giraffe"] {
            pq.push(word.to_string());
        }
        let order: Vec<String> = std::iter::from_fn(|| pq.try_pop()).collect();
        assert_eq!(order, vec!["ox", "cat", "giraffe", "elephant"]);
    }

    #[test]
    fn test_priority_empty_and_clear() {
        let pq = ConcurrentPriorityQueue::<i32>::new();
        assert_eq!(pq.try_pop(), None);
        assert_eq!(pq.wait_pop_for(Duration::from_millis(10)), None);

        pq.push(10);
        pq.push(20);
        assert_eq!(pq.len(), 2);
        assert_eq!(pq.clear(), 2);
        assert!(pq.is_empty());
    }

    #[test]
    fn test_bounded_push_times_out_when_full() {
        let queue = BoundedQueue::<VecDeque<u8>>::new(1);
        queue.try_push(1).unwrap();

        let start = Instant::now();
        match queue.push_timeout(2, Duration::from_millis(100)) {
            Err(PushError::Full(item)) => assert_eq!(item, 2),
            other => panic!("expected Full, got {:?}", other),
        }
        assert!(start.elapsed() >= Duration::from_millis(90));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_bounded_pop_frees_slot_for_blocked_pusher() {
        let queue = BoundedQueue::<VecDeque<u8>>::new(1);
        queue.try_push(1).unwrap();

        crossbeam::thread::scope(|s| {
            let pusher = s.spawn(|_| queue.push_timeout(2, Duration::from_secs(5)));
            std::thread::sleep(Duration::from_millis(50));
            assert_eq!(queue.pop(), Some(1));
            assert!(pusher.join().unwrap().is_ok());
        })
        .unwrap();

        assert_eq!(queue.try_pop(), Some(2));
    }

    #[test]
    fn test_bounded_close_wakes_everyone() {
        let full = BoundedQueue::<VecDeque<u8>>::new(1);
        full.try_push(1).unwrap();
        let empty = BoundedQueue::<VecDeque<u8>>::new(4);

        crossbeam::thread::scope(|s| {
            let pusher = s.spawn(|_| full.push_timeout(2, Duration::from_secs(10)));
            let popper = s.spawn(|_| empty.pop());
            std::thread::sleep(Duration::from_millis(50));

            full.close();
            empty.close();

            assert!(matches!(pusher.join().unwrap(), Err(PushError::Closed(2))));
            assert_eq!(popper.join().unwrap(), None);
        })
        .unwrap();

        // Buffered items stay put but are no longer handed out.
        assert!(full.is_closed());
        assert_eq!(full.pop(), None);
        assert_eq!(full.len(), 1);
        assert_eq!(full.clear(), 1);

        full.reopen();
        assert!(full.try_push(3).is_ok());
        assert_eq!(full.pop(), Some(3));
    }

    #[test]
    fn test_bounded_stale_generation_is_refused() {
        let queue = BoundedQueue::<VecDeque<u8>>::new(4);
        let first = queue.generation();

        crossbeam::thread::scope(|s| {
            let stale = s.spawn(|_| queue.pop_generation(first));
            std::thread::sleep(Duration::from_millis(50));

            queue.close();
            let second = queue.reopen();
            assert_eq!(second, first + 1);
            queue.try_push(7).unwrap();

            assert_eq!(stale.join().unwrap(), None);
            assert_eq!(queue.pop_generation(first), None);
            assert_eq!(queue.pop_generation(second), Some(7));
        })
        .unwrap();

        // Reopening without a close also retires parked consumers.
        let current = queue.generation();
        crossbeam::thread::scope(|s| {
            let parked = s.spawn(|_| queue.pop_generation(current));
            std::thread::sleep(Duration::from_millis(50));
            queue.reopen();
            assert_eq!(parked.join().unwrap(), None);
        })
        .unwrap();
        assert!(!queue.is_closed());
    }

    #[test]
    fn test_bounded_capacity_is_at_least_one() {
        let queue = BoundedQueue::<VecDeque<u8>>::new(0);
        assert_eq!(queue.capacity(), 1);
        assert!(queue.try_push(1).is_ok());
        assert!(matches!(queue.try_push(2), Err(PushError::Full(2))));
    }
}
