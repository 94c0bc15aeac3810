//! Concurrency tests for the bounded queue.
//!
//! Focus: capacity bounds, FIFO ordering across threads, timeout
//! durations, and usability after timed-out operations.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crabstream::BoundedQueue;

const TIMEOUT: Duration = Duration::from_millis(100);

#[test]
fn spsc_fifo_order_preserved() {
    let queue = Arc::new(BoundedQueue::new(8));
    let producer_queue = Arc::clone(&queue);

    let producer = thread::spawn(move || {
        for i in 0..1000u32 {
            loop {
                match producer_queue.push(i, TIMEOUT) {
                    Ok(()) => break,
                    Err(timeout) => {
                        // Consumer is slow; retry with the same item
                        let _ = timeout.into_inner();
                    }
                }
            }
        }
    });

    let mut received = Vec::with_capacity(1000);
    while received.len() < 1000 {
        if let Ok(item) = queue.pop(TIMEOUT) {
            received.push(item);
        }
    }
    producer.join().unwrap();

    let expected: Vec<u32> = (0..1000).collect();
    assert_eq!(received, expected, "items must pop in push order");
}

#[test]
fn size_never_exceeds_capacity() {
    let queue = Arc::new(BoundedQueue::new(4));
    let producer_queue = Arc::clone(&queue);
    let observer_queue = Arc::clone(&queue);

    let producer = thread::spawn(move || {
        for i in 0..200 {
            let _ = producer_queue.push(i, Duration::from_millis(5));
        }
    });

    let observer = thread::spawn(move || {
        for _ in 0..500 {
            let len = observer_queue.len();
            assert!(len <= 4, "size {} exceeded capacity", len);
            thread::yield_now();
        }
    });

    for _ in 0..200 {
        let _ = queue.pop(Duration::from_millis(5));
    }

    producer.join().unwrap();
    observer.join().unwrap();
}

#[test]
fn push_on_full_blocks_at_least_timeout() {
    let queue = BoundedQueue::new(2);
    queue.push(1, TIMEOUT).unwrap();
    queue.push(2, TIMEOUT).unwrap();

    let start = Instant::now();
    let result = queue.push(3, TIMEOUT);
    let elapsed = start.elapsed();

    assert!(result.is_err());
    assert!(
        elapsed >= TIMEOUT,
        "timed out after {:?}, expected at least {:?}",
        elapsed,
        TIMEOUT
    );
    assert_eq!(queue.len(), 2, "timed-out push must not insert");
}

#[test]
fn pop_on_empty_blocks_at_least_timeout() {
    let queue: BoundedQueue<u8> = BoundedQueue::new(2);

    let start = Instant::now();
    let result = queue.pop(TIMEOUT);
    let elapsed = start.elapsed();

    assert!(result.is_err());
    assert!(elapsed >= TIMEOUT);
}

#[test]
fn queue_usable_after_timeouts() {
    // Regression test: a timed-out operation must leave the queue
    // unlocked and fully usable by other threads.
    let queue = Arc::new(BoundedQueue::new(1));
    queue.push(1u32, TIMEOUT).unwrap();

    assert!(queue.push(2, TIMEOUT).is_err());

    let worker_queue = Arc::clone(&queue);
    let worker = thread::spawn(move || {
        let popped = worker_queue.pop(TIMEOUT).expect("pop after peer timeout");
        worker_queue
            .push(99, TIMEOUT)
            .expect("push after peer timeout");
        popped
    });

    assert_eq!(worker.join().unwrap(), 1);
    assert_eq!(queue.pop(TIMEOUT).unwrap(), 99);

    // Same thing after a pop timeout
    assert!(queue.pop(TIMEOUT).is_err());
    queue.push(7, TIMEOUT).unwrap();
    assert_eq!(queue.pop(TIMEOUT).unwrap(), 7);
}

#[test]
fn capacity_eight_fill_and_recover() {
    let queue = BoundedQueue::new(8);

    for i in 0..8 {
        queue
            .push(i, TIMEOUT)
            .unwrap_or_else(|_| panic!("push {} should succeed", i));
    }

    let start = Instant::now();
    let rejected = queue.push(8, TIMEOUT).unwrap_err();
    assert!(start.elapsed() >= TIMEOUT);
    assert_eq!(rejected.into_inner(), 8);

    assert_eq!(queue.pop(TIMEOUT).unwrap(), 0);

    let start = Instant::now();
    queue.push(8, TIMEOUT).expect("push after pop must succeed");
    assert!(
        start.elapsed() < TIMEOUT,
        "push into freed slot should not wait out the timeout"
    );
}

#[test]
fn blocked_push_wakes_on_pop() {
    let queue = Arc::new(BoundedQueue::new(1));
    queue.push(0u32, TIMEOUT).unwrap();

    let pusher_queue = Arc::clone(&queue);
    let pusher = thread::spawn(move || pusher_queue.push(1, Duration::from_secs(5)));

    // Give the pusher time to block, then free a slot
    thread::sleep(Duration::from_millis(50));
    assert_eq!(queue.pop(TIMEOUT).unwrap(), 0);

    pusher.join().unwrap().expect("push should complete via wakeup");
    assert_eq!(queue.pop(TIMEOUT).unwrap(), 1);
}

#[test]
fn blocked_pop_wakes_on_push() {
    let queue: Arc<BoundedQueue<u32>> = Arc::new(BoundedQueue::new(1));

    let popper_queue = Arc::clone(&queue);
    let popper = thread::spawn(move || popper_queue.pop(Duration::from_secs(5)));

    thread::sleep(Duration::from_millis(50));
    queue.push(42, TIMEOUT).unwrap();

    assert_eq!(popper.join().unwrap().unwrap(), 42);
}

#[test]
fn ownership_transfers_without_copies() {
    // Box contents must come back out untouched; the queue moves items,
    // it never clones them.
    let queue = BoundedQueue::new(2);
    queue.push(Box::new([0xABu8; 64]), TIMEOUT).unwrap();
    let item = queue.pop(TIMEOUT).unwrap();
    assert!(item.iter().all(|&b| b == 0xAB));
}
