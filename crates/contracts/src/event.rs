//! Event model
//!
//! Keep output stable and boring; evolve by adding fields, never by breaking
//! existing ones.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{Aabb, Fingerprint, TimestampNs};

/// Well-known event type tags.
pub mod event_types {
    /// Run header, first line of every event log
    pub const RUN_STARTED: &str = "run_started";
    pub const HEARTBEAT: &str = "heartbeat";
    pub const FRAME_STATS: &str = "frame_stats";
    pub const INPUT_EOF: &str = "input_eof";
    pub const INPUT_LOOP: &str = "input_loop";
    pub const SHUTDOWN: &str = "shutdown";
}

/// Run identity, produced once per run by the runner and consumed by
/// `EventSink::open`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunInfo {
    pub node_id: String,
    pub config_path: PathBuf,
    pub out_dir: PathBuf,

    pub config_hash: Fingerprint,
    pub calibration_hash: Fingerprint,

    /// Logical start, always zero
    pub start_time: TimestampNs,

    /// Absolute epoch start (ns); names the event log file
    pub wall_start_time: TimestampNs,
}

/// Optional geometric payload of an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialPayload {
    /// Coordinate frame the box is expressed in
    pub frame: String,
    pub aabb: Aabb,
}

/// Structured event
///
/// Optional fields left at their default are omitted from the log line.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Event {
    /// Type tag, e.g. "heartbeat", "frame_stats"
    pub kind: String,

    /// Logical time since run start
    pub t_ns: TimestampNs,

    /// Absolute epoch time
    pub t_wall_ns: TimestampNs,

    /// Optional human-readable hint
    pub message: String,

    pub spatial: Option<SpatialPayload>,
    pub confidence: f64,
    pub persistence_s: f64,
}

impl Event {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Default::default()
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_times(mut self, t_ns: TimestampNs, t_wall_ns: TimestampNs) -> Self {
        self.t_ns = t_ns;
        self.t_wall_ns = t_wall_ns;
        self
    }

    pub fn with_spatial(mut self, frame: impl Into<String>, aabb: Aabb) -> Self {
        self.spatial = Some(SpatialPayload {
            frame: frame.into(),
            aabb,
        });
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_persistence(mut self, persistence_s: f64) -> Self {
        self.persistence_s = persistence_s;
        self
    }
}
