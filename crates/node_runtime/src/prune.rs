//! Output directory housekeeping.
//!
//! Keeps the newest `keep_last` primary event logs, ordered by the start
//! timestamp embedded in their names. The latest file and anything not named
//! `events_<digits>.jsonl` are never touched.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use dispatcher::parse_event_log_name;
use tracing::{debug, warn};

/// Outcome of one pruning pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneReport {
    /// Primary logs left in place
    pub kept: usize,
    pub removed: Vec<PathBuf>,
    /// Paths that could not be deleted, with the reason
    pub failures: Vec<(PathBuf, String)>,
}

/// Best-effort pruning; errors end up in the report, never in a `Result`.
pub fn prune_event_logs(out_dir: &Path, keep_last: usize) -> PruneReport {
    let mut report = PruneReport::default();

    let entries = match fs::read_dir(out_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return report,
        Err(e) => {
            warn!(dir = %out_dir.display(), error = %e, "cannot list output directory");
            report.failures.push((out_dir.to_path_buf(), e.to_string()));
            return report;
        }
    };

    let mut logs: Vec<(i64, PathBuf)> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
        .filter_map(|entry| {
            let key = parse_event_log_name(entry.file_name().to_str()?)?;
            Some((key, entry.path()))
        })
        .collect();

    // newest first
    logs.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

    let stale = logs.split_off(keep_last.min(logs.len()));
    report.kept = logs.len();

    for (_, path) in stale {
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "pruned event log");
                report.removed.push(path);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to prune event log");
                report.failures.push((path, e.to_string()));
            }
        }
    }
    report
}
