//! Bounded blocking queue with timeout semantics
//!
//! The hand-off point between pipeline stages: a fixed-capacity FIFO of
//! owned items protected by a mutex and a pair of condition variables.
//! Both `push` and `pop` block up to a caller-supplied timeout measured
//! against the monotonic clock, so a stalled neighbor stage can never
//! wedge a worker forever.
//!
//! Items move through the queue by ownership transfer; the queue never
//! clones or copies payloads. Dropping the queue drops whatever items
//! are still resident.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// Returned by [`BoundedQueue::push`] when the queue stayed full for the
/// whole timeout. Carries the rejected item back to the caller, which
/// still owns it.
#[derive(Debug, PartialEq, Eq)]
pub struct PushTimeout<T>(pub T);

impl<T> PushTimeout<T> {
    /// Recover the item that could not be enqueued.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Display for PushTimeout<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "push timed out on a full queue")
    }
}

/// Returned by [`BoundedQueue::pop`] when the queue stayed empty for the
/// whole timeout.
#[derive(Debug, PartialEq, Eq)]
pub struct PopTimeout;

impl fmt::Display for PopTimeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pop timed out on an empty queue")
    }
}

impl std::error::Error for PopTimeout {}

/// Fixed-capacity blocking FIFO for single-producer / single-consumer
/// hand-off between pipeline stages.
///
/// Size is always within `[0, capacity]`. Wakeups are broadcast
/// (`notify_all`) on every successful push and pop; with one waiter per
/// role the extra wakeups are harmless and the code stays simple.
///
/// The lock is released on every exit path, including timeouts; a
/// timed-out caller leaves the queue fully usable by its peers.
pub struct BoundedQueue<T> {
    items: Mutex<VecDeque<T>>,
    not_full: Condvar,
    not_empty: Condvar,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    /// Create a queue holding at most `capacity` items.
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be non-zero");
        Self {
            items: Mutex::new(VecDeque::with_capacity(capacity)),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            capacity,
        }
    }

    /// Append `item` at the tail, blocking until a slot frees up or
    /// `timeout` elapses.
    ///
    /// On timeout the item is handed back inside the error and the queue
    /// is unchanged.
    pub fn push(&self, item: T, timeout: Duration) -> Result<(), PushTimeout<T>> {
        let deadline = Instant::now() + timeout;
        let mut items = self.items.lock().unwrap();
        loop {
            if items.len() < self.capacity {
                items.push_back(item);
                drop(items);
                self.not_empty.notify_all();
                return Ok(());
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(PushTimeout(item));
            }
            let (guard, _) = self.not_full.wait_timeout(items, deadline - now).unwrap();
            items = guard;
        }
    }

    /// Remove and return the head item, blocking until one is available
    /// or `timeout` elapses.
    pub fn pop(&self, timeout: Duration) -> Result<T, PopTimeout> {
        let deadline = Instant::now() + timeout;
        let mut items = self.items.lock().unwrap();
        loop {
            if let Some(item) = items.pop_front() {
                drop(items);
                self.not_full.notify_all();
                return Ok(item);
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(PopTimeout);
            }
            let (guard, _) = self.not_empty.wait_timeout(items, deadline - now).unwrap();
            items = guard;
        }
    }

    /// Remove and return the head item without blocking.
    pub fn try_pop(&self) -> Option<T> {
        let item = self.items.lock().unwrap().pop_front();
        if item.is_some() {
            self.not_full.notify_all();
        }
        item
    }

    /// Snapshot of the remaining free slots.
    ///
    /// The value may be stale by the time the caller acts on it; treat it
    /// as a heuristic for attempting a push, never as a guarantee that
    /// one will succeed.
    pub fn free_capacity(&self) -> usize {
        self.capacity - self.items.lock().unwrap().len()
    }

    /// Number of items currently queued.
    pub fn len(&self) -> usize {
        self.items.lock().unwrap().len()
    }

    /// Whether the queue is currently empty.
    pub fn is_empty(&self) -> bool {
        self.items.lock().unwrap().is_empty()
    }

    /// The fixed capacity chosen at construction.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
