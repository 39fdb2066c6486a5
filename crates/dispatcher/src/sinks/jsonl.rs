//! JsonlEventSink - append-only JSON-lines event log

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use contracts::{ContractError, Event, EventSink, RunInfo};
use tracing::{debug, instrument, warn};

use crate::metrics::SinkMetrics;
use crate::naming::{event_log_path, latest_log_path};
use crate::record::{event_line, header_line};

struct LogFile {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl LogFile {
    fn open(path: PathBuf, truncate: bool) -> Result<Self, ContractError> {
        let mut options = OpenOptions::new();
        options.create(true);
        if truncate {
            options.write(true).truncate(true);
        } else {
            options.append(true);
        }
        let file = options
            .open(&path)
            .map_err(|e| ContractError::io_at(&path, e))?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    fn write_line(&mut self, line: &str) -> Result<(), ContractError> {
        self.writer
            .write_all(line.as_bytes())
            .map_err(|e| ContractError::io_at(&self.path, e))
    }

    fn flush(&mut self) -> Result<(), ContractError> {
        self.writer
            .flush()
            .map_err(|e| ContractError::io_at(&self.path, e))
    }
}

struct Session {
    primary: LogFile,
    latest: Option<LogFile>,
}

impl Session {
    fn files_mut(&mut self) -> impl Iterator<Item = &mut LogFile> {
        std::iter::once(&mut self.primary).chain(self.latest.as_mut())
    }
}

/// Sink that writes one JSON object per line to `events_<wall_start_ns>.jsonl`
/// and, optionally, to a truncated-per-run `events_latest.jsonl`.
pub struct JsonlEventSink {
    name: String,
    write_latest: bool,
    session: Option<Session>,
    metrics: SinkMetrics,
}

impl Default for JsonlEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonlEventSink {
    /// Sink that also maintains the latest file
    pub fn new() -> Self {
        Self {
            name: "jsonl".to_string(),
            write_latest: true,
            session: None,
            metrics: SinkMetrics::new(),
        }
    }

    pub fn with_latest(mut self, write_latest: bool) -> Self {
        self.write_latest = write_latest;
        self
    }

    /// Primary log of the open session
    pub fn path(&self) -> Option<&Path> {
        self.session.as_ref().map(|s| s.primary.path.as_path())
    }

    /// Latest file of the open session, if maintained
    pub fn latest_path(&self) -> Option<&Path> {
        self.session
            .as_ref()
            .and_then(|s| s.latest.as_ref())
            .map(|f| f.path.as_path())
    }

    pub fn metrics(&self) -> &SinkMetrics {
        &self.metrics
    }

    fn write_all_files(session: &mut Session, line: &str) -> Result<(), ContractError> {
        for file in session.files_mut() {
            file.write_line(line)?;
        }
        Ok(())
    }
}

impl EventSink for JsonlEventSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "jsonl_sink_open", skip(self, run), fields(node_id = %run.node_id))]
    fn open(&mut self, run: &RunInfo) -> Result<(), ContractError> {
        self.close();

        fs::create_dir_all(&run.out_dir).map_err(|e| ContractError::io_at(&run.out_dir, e))?;

        let wall_start_ns = run.wall_start_time.as_nanos();
        let primary = LogFile::open(event_log_path(&run.out_dir, wall_start_ns), false)?;
        let latest = if self.write_latest {
            Some(LogFile::open(latest_log_path(&run.out_dir), true)?)
        } else {
            None
        };
        let mut session = Session { primary, latest };

        let header = header_line(run)?;
        Self::write_all_files(&mut session, &header)?;
        for file in session.files_mut() {
            file.flush()?;
        }
        self.metrics.record_write(header.len());

        debug!(
            path = %session.primary.path.display(),
            latest = self.write_latest,
            "event log opened"
        );
        self.session = Some(session);
        Ok(())
    }

    #[instrument(
        name = "jsonl_sink_emit",
        level = "trace",
        skip(self, event),
        fields(kind = %event.kind)
    )]
    fn emit(&mut self, event: &Event) -> Result<(), ContractError> {
        let Some(session) = self.session.as_mut() else {
            return Err(ContractError::internal(format!(
                "emit on closed sink '{}'",
                self.name
            )));
        };

        let line = event_line(event)?;
        match Self::write_all_files(session, &line) {
            Ok(()) => {
                self.metrics.record_write(line.len());
                Ok(())
            }
            Err(e) => {
                self.metrics.record_failure();
                Err(e)
            }
        }
    }

    fn flush(&mut self) -> Result<(), ContractError> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        for file in session.files_mut() {
            file.flush()?;
        }
        self.metrics.record_flush();
        Ok(())
    }

    fn close(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        for file in session.files_mut() {
            if let Err(e) = file.flush() {
                warn!(sink = %self.name, error = %e, "flush on close failed");
            }
        }
        debug!(sink = %self.name, events = self.metrics.write_count(), "event log closed");
    }

    fn is_open(&self) -> bool {
        self.session.is_some()
    }
}

impl Drop for JsonlEventSink {
    fn drop(&mut self) {
        self.close();
    }
}
