//! Capture configuration, host filtering and record serialization for
//! wiretap.
//!
//! This crate is the leaf of the capture pipeline: it knows what a
//! [`CaptureRecord`] looks like and how to build one from an observed
//! exchange, but nothing about delivery.

mod config;
mod error;
pub mod record;
pub mod serialize;

pub use config::{CaptureConfig, DEFAULT_REDACT_HEADERS, DEFAULT_SERVER_URL};
pub use error::{CoreError, CoreResult};
pub use record::{CaptureRecord, ClientMeta, Headers, RequestData, ResponseData};
pub use serialize::{build, Body, Observation, REDACTED, UNSERIALIZABLE};
