//! Bounded delivery queue.
//!
//! Producers never wait: a full queue drops the incoming record. The single
//! consumer blocks in [`DeliveryQueue::pop`] until work arrives and reports
//! completion through [`DeliveryQueue::task_done`], which is what
//! [`DeliveryQueue::wait_drained`] observes.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use wiretap_core::CaptureRecord;

/// Default maximum number of queued records.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

/// Snapshot of queue counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueStats {
    /// Records waiting to be picked up.
    pub pending: usize,
    /// Records accepted but not yet marked done (pending + in flight).
    pub unfinished: usize,
    /// Records accepted since creation.
    pub accepted: u64,
    /// Records dropped because the queue was full.
    pub dropped: u64,
}

struct QueueState {
    items: VecDeque<CaptureRecord>,
    unfinished: usize,
    accepted: u64,
    dropped: u64,
}

/// FIFO of records awaiting delivery.
///
/// `unfinished` and both condition variables are guarded by the same mutex,
/// so a waiter can never miss the transition to zero between checking the
/// count and going to sleep.
pub struct DeliveryQueue {
    capacity: usize,
    state: Mutex<QueueState>,
    not_empty: Condvar,
    all_done: Condvar,
}

impl DeliveryQueue {
    /// Create a queue holding at most `capacity` records (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity.min(DEFAULT_QUEUE_CAPACITY)),
                unfinished: 0,
                accepted: 0,
                dropped: 0,
            }),
            not_empty: Condvar::new(),
            all_done: Condvar::new(),
        }
    }

    /// Maximum number of queued records.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a record without blocking.
    ///
    /// Returns `false` when the queue is full; the record is dropped and a
    /// warning is logged.
    pub fn enqueue(&self, record: CaptureRecord) -> bool {
        let mut state = self.state.lock();
        if state.items.len() >= self.capacity {
            state.dropped += 1;
            let dropped = state.dropped;
            drop(state);
            warn!(
                capture_id = %record.id,
                capacity = self.capacity,
                dropped,
                "Capture dropped: delivery queue is full"
            );
            return false;
        }

        state.items.push_back(record);
        state.unfinished += 1;
        state.accepted += 1;
        drop(state);

        self.not_empty.notify_one();
        true
    }

    /// Take the oldest record, blocking while the queue is empty.
    pub fn pop(&self) -> CaptureRecord {
        let mut state = self.state.lock();
        loop {
            if let Some(record) = state.items.pop_front() {
                return record;
            }
            self.not_empty.wait(&mut state);
        }
    }

    /// Take the oldest record, waiting at most `timeout`.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<CaptureRecord> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        loop {
            if let Some(record) = state.items.pop_front() {
                return Some(record);
            }
            if self.not_empty.wait_until(&mut state, deadline).timed_out() {
                return state.items.pop_front();
            }
        }
    }

    /// Mark one previously popped record as processed, whatever the outcome
    /// of its delivery.
    pub fn task_done(&self) {
        let mut state = self.state.lock();
        if state.unfinished == 0 {
            drop(state);
            warn!("task_done called with no unfinished captures");
            return;
        }

        state.unfinished -= 1;
        if state.unfinished == 0 {
            self.all_done.notify_all();
        }
    }

    /// Block until every accepted record has been marked done, or `timeout`
    /// elapses. Returns whether the queue drained.
    pub fn wait_drained(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        if state.unfinished > 0 {
            debug!(unfinished = state.unfinished, "Waiting for captures to drain");
        }
        while state.unfinished > 0 {
            if self.all_done.wait_until(&mut state, deadline).timed_out() {
                return state.unfinished == 0;
            }
        }
        true
    }

    /// Number of records waiting to be popped.
    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    /// Check if no records are waiting to be popped.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Records accepted but not yet marked done.
    pub fn unfinished(&self) -> usize {
        self.state.lock().unfinished
    }

    /// Consistent snapshot of all counters.
    pub fn stats(&self) -> QueueStats {
        let state = self.state.lock();
        QueueStats {
            pending: state.items.len(),
            unfinished: state.unfinished,
            accepted: state.accepted,
            dropped: state.dropped,
        }
    }
}

impl Default for DeliveryQueue {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}
