//! `runs` command implementation.

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, SecondsFormat};
use dispatcher::parse_event_log_name;
use serde::Serialize;
use tracing::{info, warn};

use crate::cli::RunsArgs;
use crate::error::Result;

/// One prior run, read from its event log
#[derive(Debug, Serialize)]
struct RunEntry {
    file: PathBuf,
    wall_start_ns: i64,
    started_utc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    node_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    config_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    calibration_hash: Option<String>,
    /// Lines after the header
    events: usize,
}

/// Execute the `runs` command
pub fn run_runs(args: &RunsArgs) -> Result<()> {
    info!(out_dir = %args.out_dir.display(), "Listing runs");

    let entries = collect_runs(&args.out_dir)?;

    if args.json {
        let json = serde_json::to_string_pretty(&entries).context("Failed to serialize runs")?;
        println!("{json}");
        return Ok(());
    }

    if entries.is_empty() {
        println!("No runs in {}", args.out_dir.display());
        return Ok(());
    }

    println!(
        "{:<26} {:<16} {:<16} {:<16} {:>8}",
        "STARTED (UTC)", "NODE", "CONFIG", "CALIBRATION", "EVENTS"
    );
    for entry in &entries {
        println!(
            "{:<26} {:<16} {:<16} {:<16} {:>8}",
            entry.started_utc,
            entry.node_id.as_deref().unwrap_or("?"),
            entry.config_hash.as_deref().unwrap_or("?"),
            entry.calibration_hash.as_deref().unwrap_or("?"),
            entry.events
        );
    }
    Ok(())
}

/// Runs in `out_dir`, newest first
fn collect_runs(out_dir: &Path) -> Result<Vec<RunEntry>> {
    let dir = fs::read_dir(out_dir)
        .with_context(|| format!("Failed to list {}", out_dir.display()))?;

    let mut entries = Vec::new();
    for item in dir.filter_map(std::result::Result::ok) {
        let name = item.file_name();
        let Some(wall_start_ns) = name.to_str().and_then(parse_event_log_name) else {
            continue;
        };
        match read_entry(&item.path(), wall_start_ns) {
            Ok(entry) => entries.push(entry),
            Err(e) => warn!(path = %item.path().display(), error = %e, "Skipping unreadable run log"),
        }
    }

    entries.sort_by(|a, b| b.wall_start_ns.cmp(&a.wall_start_ns));
    Ok(entries)
}

fn read_entry(path: &Path, wall_start_ns: i64) -> std::io::Result<RunEntry> {
    let reader = BufReader::new(fs::File::open(path)?);
    let mut lines = reader.lines();

    let header: Option<serde_json::Value> = match lines.next() {
        Some(line) => serde_json::from_str(&line?).ok(),
        None => None,
    };
    let field = |key: &str| {
        header
            .as_ref()
            .and_then(|h| h.get(key))
            .and_then(|v| v.as_str())
            .map(str::to_string)
    };

    Ok(RunEntry {
        file: path.to_path_buf(),
        wall_start_ns,
        started_utc: DateTime::from_timestamp_nanos(wall_start_ns)
            .to_rfc3339_opts(SecondsFormat::Millis, true),
        node_id: field("node_id"),
        config_hash: field("config_hash"),
        calibration_hash: field("calibration_hash"),
        events: lines.map_while(std::result::Result::ok).count(),
    })
}
