//! Outbox manager: owns the delivery queue and the transport worker.

use crate::queue::{QueueStats, DEFAULT_QUEUE_CAPACITY};
use crate::{CollectorSender, Delivery, DeliveryQueue, OutboxError, OutboxResult, SenderConfig};
use parking_lot::{Mutex, RwLock};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};
use wiretap_core::CaptureRecord;

/// Name of the background transport thread.
pub const WORKER_THREAD_NAME: &str = "wiretap-transport";

/// Outbox configuration.
#[derive(Debug, Clone)]
pub struct OutboxConfig {
    /// Maximum number of queued records before new ones are dropped.
    pub queue_capacity: usize,
    /// Sender settings used by [`OutboxManager::start`].
    pub sender: SenderConfig,
}

impl Default for OutboxConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            sender: SenderConfig::default(),
        }
    }
}

enum WorkerState {
    Idle,
    Running { thread: JoinHandle<()> },
}

/// Coordinates the delivery queue and its single consumer thread.
///
/// The worker is detached: it is never joined and keeps waiting for work
/// until the process exits. Draining is observed through the queue's
/// completion counter rather than by stopping the thread.
pub struct OutboxManager {
    config: OutboxConfig,
    queue: Arc<DeliveryQueue>,
    endpoint: Arc<RwLock<String>>,
    worker: Mutex<WorkerState>,
}

impl OutboxManager {
    /// Create a manager with an empty queue and no worker.
    pub fn new(config: OutboxConfig) -> Self {
        let queue = Arc::new(DeliveryQueue::new(config.queue_capacity));
        Self {
            config,
            queue,
            endpoint: Arc::new(RwLock::new(String::new())),
            worker: Mutex::new(WorkerState::Idle),
        }
    }

    /// The underlying queue.
    pub fn queue(&self) -> &Arc<DeliveryQueue> {
        &self.queue
    }

    /// Start the HTTP transport worker targeting `endpoint`.
    ///
    /// Idempotent: if a worker is already running only the endpoint is
    /// updated, and subsequent deliveries use the new value.
    pub fn start(&self, endpoint: &str) -> OutboxResult<()> {
        let sender_config = self.config.sender.clone();
        self.start_with(endpoint, move || CollectorSender::new(&sender_config))
    }

    /// Start the worker with a custom delivery.
    ///
    /// `make_delivery` runs on the worker thread. If it fails or panics,
    /// the worker still consumes the queue so that flushes complete,
    /// discarding every record. A worker thread that has died is replaced.
    pub fn start_with<D, F>(&self, endpoint: &str, make_delivery: F) -> OutboxResult<()>
    where
        D: Delivery,
        F: FnOnce() -> OutboxResult<D> + Send + 'static,
    {
        *self.endpoint.write() = endpoint.trim_end_matches('/').to_string();

        let mut worker = self.worker.lock();
        if let WorkerState::Running { thread } = &*worker {
            if !thread.is_finished() {
                debug!(endpoint = %endpoint, "Transport worker already running, endpoint updated");
                return Ok(());
            }
            warn!(endpoint = %endpoint, "Transport worker exited, restarting");
        }

        let queue = self.queue.clone();
        let shared_endpoint = self.endpoint.clone();
        let thread = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || run_worker(queue, shared_endpoint, make_delivery))
            .map_err(OutboxError::Spawn)?;

        *worker = WorkerState::Running { thread };
        info!(endpoint = %endpoint, capacity = self.queue.capacity(), "Transport worker started");
        Ok(())
    }

    /// Hand a record to the worker. Returns false if it was dropped.
    pub fn enqueue(&self, record: CaptureRecord) -> bool {
        self.queue.enqueue(record)
    }

    /// Block until every accepted record has been attempted, or `timeout`
    /// elapses. Returns true if the queue drained in time.
    pub fn flush(&self, timeout: Duration) -> bool {
        let drained = self.queue.wait_drained(timeout);
        if !drained {
            warn!(
                unfinished = self.queue.unfinished(),
                timeout_ms = timeout.as_millis() as u64,
                "Flush timed out with captures still pending"
            );
        }
        drained
    }

    /// Drain the queue before process exit.
    ///
    /// Same as [`flush`](Self::flush); the worker is left running.
    pub fn shutdown(&self, timeout: Duration) -> bool {
        let drained = self.flush(timeout);
        info!(drained, "Transport shutdown");
        drained
    }

    /// Whether a worker has been started and is still alive.
    pub fn is_running(&self) -> bool {
        match &*self.worker.lock() {
            WorkerState::Idle => false,
            WorkerState::Running { thread } => !thread.is_finished(),
        }
    }

    /// Current collector base URL (empty before the first start).
    pub fn endpoint(&self) -> String {
        self.endpoint.read().clone()
    }

    /// Queue counters plus worker state.
    pub fn status(&self) -> QueueStatus {
        QueueStatus {
            queue: self.queue.stats(),
            running: self.is_running(),
            endpoint: self.endpoint(),
        }
    }
}

/// Status of the outbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueStatus {
    /// Queue counters.
    pub queue: QueueStats,
    /// Whether the worker thread is alive.
    pub running: bool,
    /// Collector base URL.
    pub endpoint: String,
}

fn run_worker<D, F>(queue: Arc<DeliveryQueue>, endpoint: Arc<RwLock<String>>, make_delivery: F)
where
    D: Delivery,
    F: FnOnce() -> OutboxResult<D>,
{
    let created = panic::catch_unwind(AssertUnwindSafe(make_delivery))
        .unwrap_or_else(|payload| Err(OutboxError::Panicked(panic_message(payload.as_ref()))));

    let delivery = match created {
        Ok(delivery) => Some(delivery),
        Err(e) => {
            error!(error = %e, "Transport unavailable, captures will be discarded");
            None
        }
    };

    loop {
        let record = queue.pop();
        if let Some(delivery) = &delivery {
            let endpoint = endpoint.read().clone();
            deliver_one(delivery, &endpoint, &record);
        }
        queue.task_done();
    }
}

fn deliver_one<D: Delivery>(delivery: &D, endpoint: &str, record: &CaptureRecord) {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| delivery.deliver(endpoint, record)))
        .unwrap_or_else(|payload| Err(OutboxError::Panicked(panic_message(payload.as_ref()))));

    match outcome {
        Ok(()) => debug!(capture_id = %record.id, "Capture delivered"),
        Err(e) => warn!(
            endpoint = %endpoint,
            capture_id = %record.id,
            error = %e,
            "Failed to send capture"
        ),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
