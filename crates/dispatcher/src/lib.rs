//! # Dispatcher
//!
//! Event output for a node run.
//!
//! Responsibilities:
//! - Encode events as JSON lines (`record`)
//! - Own event log naming (`naming`) and rotation
//! - Sinks implementing [`contracts::EventSink`]: the append-only JSON-lines
//!   log, a tracing mirror, a fan-out, and an in-memory recorder

pub mod metrics;
pub mod naming;
pub mod record;
pub mod sinks;

pub use contracts::EventSink;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use naming::{event_log_file_name, parse_event_log_name, LATEST_FILE_NAME};
pub use sinks::{FanOutSink, JsonlEventSink, LogEventSink, MemoryEventSink};
