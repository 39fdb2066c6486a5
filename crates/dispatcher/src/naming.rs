//! Event log file naming.
//!
//! Primary logs are `events_<wall_start_ns>.jsonl`, so runs never collide and
//! sort by start. `events_latest.jsonl` is a fixed-name mirror of the most
//! recent run.

use std::path::{Path, PathBuf};

const PREFIX: &str = "events_";
const SUFFIX: &str = ".jsonl";

/// Name of the per-run mirror file
pub const LATEST_FILE_NAME: &str = "events_latest.jsonl";

/// File name of the primary log for a run starting at `wall_start_ns`
pub fn event_log_file_name(wall_start_ns: i64) -> String {
    format!("{PREFIX}{wall_start_ns}{SUFFIX}")
}

pub fn event_log_path(out_dir: &Path, wall_start_ns: i64) -> PathBuf {
    out_dir.join(event_log_file_name(wall_start_ns))
}

pub fn latest_log_path(out_dir: &Path) -> PathBuf {
    out_dir.join(LATEST_FILE_NAME)
}

/// Start timestamp embedded in a primary log name.
///
/// `None` for the latest file and for anything not shaped
/// `events_<digits>.jsonl`.
pub fn parse_event_log_name(name: &str) -> Option<i64> {
    let digits = name.strip_prefix(PREFIX)?.strip_suffix(SUFFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
