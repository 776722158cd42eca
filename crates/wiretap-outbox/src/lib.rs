//! Background delivery of captured exchanges to the collector.
//!
//! This crate provides:
//! - OutboxManager: owns the queue and the single detached transport thread
//! - DeliveryQueue: bounded FIFO that drops on overflow and tracks completion
//! - CollectorSender: blocking HTTP sender posting one record per request

mod error;
mod manager;
mod queue;
mod sender;

pub use error::{OutboxError, OutboxResult};
pub use manager::{OutboxConfig, OutboxManager, QueueStatus, WORKER_THREAD_NAME};
pub use queue::{DeliveryQueue, QueueStats, DEFAULT_QUEUE_CAPACITY};
pub use sender::{
    capture_url, CollectorSender, Delivery, SenderConfig, CAPTURE_PATH, DEFAULT_TIMEOUT_SECS,
};
