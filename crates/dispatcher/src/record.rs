//! JSON-lines record encoding
//!
//! One self-contained line per record, newline-terminated. Required fields
//! always come first in a fixed order; optional fields are omitted while at
//! their default. Seconds fields are rendered from the integer nanoseconds
//! with six fixed decimals and written as JSON numbers.

use std::borrow::Cow;

use contracts::{event_types, Aabb, ContractError, Event, Fingerprint, RunInfo, TimestampNs};
use serde::Serialize;
use serde_json::value::RawValue;

/// Version of the event log layout, written in every header
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Serialize)]
struct HeaderRecord<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    t_ns: i64,
    t_s: Box<RawValue>,
    t_wall_ns: i64,
    t_wall_s: Box<RawValue>,
    node_id: &'a str,
    config_path: Cow<'a, str>,
    out_dir: Cow<'a, str>,
    config_hash: Fingerprint,
    calibration_hash: Fingerprint,
    schema_version: u32,
}

#[derive(Serialize)]
struct EventRecord<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    t_ns: i64,
    t_s: Box<RawValue>,
    t_wall_ns: i64,
    t_wall_s: Box<RawValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frame: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    aabb: Option<&'a Aabb>,
    #[serde(skip_serializing_if = "is_empty")]
    message: &'a str,
    #[serde(skip_serializing_if = "is_zero")]
    confidence: f64,
    #[serde(skip_serializing_if = "is_zero")]
    persistence_s: f64,
}

fn is_empty(s: &&str) -> bool {
    s.is_empty()
}

fn is_zero(v: &f64) -> bool {
    *v == 0.0
}

fn seconds(t: TimestampNs) -> Result<Box<RawValue>, ContractError> {
    RawValue::from_string(t.format_secs())
        .map_err(|e| ContractError::internal(format!("seconds rendering: {e}")))
}

fn finish_line<T: Serialize>(record: &T) -> Result<String, ContractError> {
    let mut line = serde_json::to_string(record)
        .map_err(|e| ContractError::internal(format!("event encoding: {e}")))?;
    line.push('\n');
    Ok(line)
}

/// `run_started` header line for `run`.
pub fn header_line(run: &RunInfo) -> Result<String, ContractError> {
    finish_line(&HeaderRecord {
        kind: event_types::RUN_STARTED,
        t_ns: run.start_time.as_nanos(),
        t_s: seconds(run.start_time)?,
        t_wall_ns: run.wall_start_time.as_nanos(),
        t_wall_s: seconds(run.wall_start_time)?,
        node_id: &run.node_id,
        config_path: run.config_path.to_string_lossy(),
        out_dir: run.out_dir.to_string_lossy(),
        config_hash: run.config_hash,
        calibration_hash: run.calibration_hash,
        schema_version: SCHEMA_VERSION,
    })
}

/// Line for one event.
pub fn event_line(event: &Event) -> Result<String, ContractError> {
    let spatial = event.spatial.as_ref();
    finish_line(&EventRecord {
        kind: &event.kind,
        t_ns: event.t_ns.as_nanos(),
        t_s: seconds(event.t_ns)?,
        t_wall_ns: event.t_wall_ns.as_nanos(),
        t_wall_s: seconds(event.t_wall_ns)?,
        frame: spatial.map(|s| s.frame.as_str()),
        aabb: spatial.map(|s| &s.aabb),
        message: &event.message,
        confidence: event.confidence,
        persistence_s: event.persistence_s,
    })
}
