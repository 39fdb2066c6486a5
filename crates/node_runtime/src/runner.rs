//! Run lifecycle controller
//!
//! `NodeRunner` owns the time origin of a run: the monotonic instant logical
//! timestamps are measured from, and the wall epoch start that names the
//! event log. One runner per process; all run state lives here.

use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use contracts::{event_types, ContractError, Event, EventSink, NodeConfig, RunInfo, TimestampNs};
use fingerprint::{hash_calibration, hash_config};
use tracing::{debug, info, warn};

use crate::prune::{prune_event_logs, PruneReport};

/// Time origin captured at `start`
#[derive(Debug, Clone, Copy)]
struct RunClock {
    t0: Instant,
    wall_start_ns: i64,
}

impl RunClock {
    fn since_start(&self) -> TimestampNs {
        let ns = i64::try_from(self.t0.elapsed().as_nanos()).unwrap_or(i64::MAX);
        TimestampNs::from_nanos(ns)
    }
}

/// Current wall clock as epoch nanoseconds
pub fn wall_now() -> Result<TimestampNs, ContractError> {
    let since_epoch = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| ContractError::internal(format!("system clock before epoch: {e}")))?;
    let ns = i64::try_from(since_epoch.as_nanos())
        .map_err(|_| ContractError::internal("system clock out of range"))?;
    Ok(TimestampNs::from_nanos(ns))
}

/// Run lifecycle controller
///
/// ```text
/// NotStarted --start()--> Running --stop()--> Stopped (== NotStarted)
/// ```
///
/// Every emission stamps logical time from the monotonic origin and wall time
/// from the system clock independently.
pub struct NodeRunner {
    config: NodeConfig,
    config_path: PathBuf,
    clock: Option<RunClock>,
    run_info: Option<RunInfo>,
    last_prune: Option<PruneReport>,
}

impl NodeRunner {
    pub fn new(config: NodeConfig, config_path: impl Into<PathBuf>) -> Self {
        Self {
            config,
            config_path: config_path.into(),
            clock: None,
            run_info: None,
            last_prune: None,
        }
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn is_running(&self) -> bool {
        self.clock.is_some()
    }

    /// Identity of the current (or last) run
    pub fn run_info(&self) -> Option<&RunInfo> {
        self.run_info.as_ref()
    }

    /// Outcome of the pruning pass done by the last `start`
    pub fn last_prune(&self) -> Option<&PruneReport> {
        self.last_prune.as_ref()
    }

    /// Logical time since start, zero when not running
    pub fn since_start(&self) -> TimestampNs {
        self.clock
            .map(|c| c.since_start())
            .unwrap_or(TimestampNs::ZERO)
    }

    /// Prune old logs, capture the time origin, fingerprint the config and
    /// open `sink` with the run header.
    ///
    /// The runner only counts as running once the sink opened successfully.
    pub fn start<S>(&mut self, sink: &mut S) -> Result<RunInfo, ContractError>
    where
        S: EventSink + ?Sized,
    {
        if self.is_running() {
            debug!("start on a running runner, previous run is replaced");
            self.clock = None;
        }

        let out_dir = self.config.output.out_dir.clone();
        let keep = usize::try_from(self.config.output.keep_last_runs).unwrap_or(usize::MAX);
        let report = prune_event_logs(&out_dir, keep);
        if !report.removed.is_empty() || !report.failures.is_empty() {
            info!(
                dir = %out_dir.display(),
                kept = report.kept,
                removed = report.removed.len(),
                failures = report.failures.len(),
                "pruned old event logs"
            );
        }
        self.last_prune = Some(report);

        let t0 = Instant::now();
        let wall_start = wall_now()?;

        let run = RunInfo {
            node_id: self.config.node_id.clone(),
            config_path: self.config_path.clone(),
            out_dir,
            config_hash: hash_config(&self.config),
            calibration_hash: hash_calibration(&self.config.calibration),
            start_time: TimestampNs::ZERO,
            wall_start_time: wall_start,
        };

        sink.open(&run)?;

        self.clock = Some(RunClock {
            t0,
            wall_start_ns: wall_start.as_nanos(),
        });
        self.run_info = Some(run.clone());

        info!(
            node_id = %run.node_id,
            config_hash = %run.config_hash,
            calibration_hash = %run.calibration_hash,
            wall_start_ns = run.wall_start_time.as_nanos(),
            "run started"
        );
        Ok(run)
    }

    /// Heartbeat stamped with the current logical time
    pub fn emit_heartbeat<S>(&self, sink: &mut S, message: &str) -> Result<(), ContractError>
    where
        S: EventSink + ?Sized,
    {
        let clock = self.running_clock()?;
        self.emit_heartbeat_at(sink, clock.since_start(), message)
    }

    /// Heartbeat stamped with a caller-chosen logical time
    pub fn emit_heartbeat_at<S>(
        &self,
        sink: &mut S,
        t_ns: TimestampNs,
        message: &str,
    ) -> Result<(), ContractError>
    where
        S: EventSink + ?Sized,
    {
        self.running_clock()?;
        let event = Event::new(event_types::HEARTBEAT)
            .with_message(message)
            .with_times(t_ns, wall_now()?);
        self.dispatch(sink, &event)
    }

    pub fn emit_event<S>(&self, sink: &mut S, kind: &str, message: &str) -> Result<(), ContractError>
    where
        S: EventSink + ?Sized,
    {
        self.emit_stamped(sink, Event::new(kind).with_message(message))
    }

    /// Emit a fully built event; both timestamps are overwritten.
    pub fn emit_stamped<S>(&self, sink: &mut S, event: Event) -> Result<(), ContractError>
    where
        S: EventSink + ?Sized,
    {
        let clock = self.running_clock()?;
        let event = event.with_times(clock.since_start(), wall_now()?);
        self.dispatch(sink, &event)
    }

    /// Flush and close the sink. Errors are logged, never returned.
    pub fn stop<S>(&mut self, sink: &mut S)
    where
        S: EventSink + ?Sized,
    {
        if let Err(e) = sink.flush() {
            warn!(sink = sink.name(), error = %e, "flush on stop failed");
        }
        sink.close();

        if let Some(clock) = self.clock.take() {
            info!(
                wall_start_ns = clock.wall_start_ns,
                elapsed_s = clock.since_start().as_secs_f64(),
                "run stopped"
            );
        }
    }

    fn running_clock(&self) -> Result<RunClock, ContractError> {
        self.clock
            .ok_or_else(|| ContractError::internal("runner is not started"))
    }

    fn dispatch<S>(&self, sink: &mut S, event: &Event) -> Result<(), ContractError>
    where
        S: EventSink + ?Sized,
    {
        sink.emit(event)?;
        observability::record_event_emitted(&event.kind);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ErrorKind, Fingerprint};
    use dispatcher::{event_log_file_name, JsonlEventSink, MemoryEventSink, LATEST_FILE_NAME};
    use std::fs;
    use tempfile::tempdir;

    fn config_in(out_dir: &Path) -> NodeConfig {
        let mut cfg = NodeConfig::default();
        cfg.node_id = "node_test".into();
        cfg.output.out_dir = out_dir.to_path_buf();
        cfg
    }

    #[test]
    fn start_opens_sink_with_fingerprints() {
        let dir = tempdir().unwrap();
        let cfg = config_in(dir.path());
        let mut runner = NodeRunner::new(cfg.clone(), "node.toml");
        let mut sink = MemoryEventSink::new();
        let runs = sink.runs();

        let run = runner.start(&mut sink).unwrap();
        assert!(runner.is_running());
        assert_eq!(run.start_time, TimestampNs::ZERO);
        assert!(run.wall_start_time.as_nanos() > 0);
        assert_eq!(run.config_hash, hash_config(&cfg));
        assert_eq!(run.calibration_hash, hash_calibration(&cfg.calibration));
        assert_ne!(run.config_hash, Fingerprint(0));
        assert_eq!(runs.lock().unwrap().as_slice(), &[run.clone()]);
        assert_eq!(runner.run_info(), Some(&run));
    }

    #[test]
    fn emission_before_start_is_internal_error() {
        let runner = NodeRunner::new(NodeConfig::default(), "x.toml");
        let mut sink = MemoryEventSink::new();
        for err in [
            runner.emit_heartbeat(&mut sink, "alive").unwrap_err(),
            runner
                .emit_heartbeat_at(&mut sink, TimestampNs(5), "alive")
                .unwrap_err(),
            runner.emit_event(&mut sink, "frame_stats", "x").unwrap_err(),
        ] {
            assert_eq!(err.kind(), ErrorKind::Internal);
        }
        assert_eq!(runner.since_start(), TimestampNs::ZERO);
    }

    #[test]
    fn failed_open_leaves_runner_stopped() {
        let dir = tempdir().unwrap();
        let mut runner = NodeRunner::new(config_in(dir.path()), "x.toml");
        let mut sink = MemoryEventSink::new().fail_open();
        assert_eq!(runner.start(&mut sink).unwrap_err().kind(), ErrorKind::Io);
        assert!(!runner.is_running());
        assert!(runner.run_info().is_none());
    }

    #[test]
    fn emissions_carry_times_and_messages() {
        let dir = tempdir().unwrap();
        let mut runner = NodeRunner::new(config_in(dir.path()), "x.toml");
        let mut sink = MemoryEventSink::new();
        let events = sink.events();
        let run = runner.start(&mut sink).unwrap();

        runner.emit_heartbeat(&mut sink, "alive tick=0").unwrap();
        runner
            .emit_heartbeat_at(&mut sink, TimestampNs(8_000_000_000), "replayed")
            .unwrap();
        runner
            .emit_event(&mut sink, "frame_stats", "frame_id=synth_0")
            .unwrap();
        runner
            .emit_stamped(
                &mut sink,
                Event::new("change")
                    .with_times(TimestampNs(-1), TimestampNs(-1))
                    .with_confidence(0.9),
            )
            .unwrap();

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 4);
        assert_eq!(events[0].kind, "heartbeat");
        assert_eq!(events[0].message, "alive tick=0");
        assert_eq!(events[1].t_ns, TimestampNs(8_000_000_000));
        assert_eq!(events[2].kind, "frame_stats");
        assert!(events[3].t_ns >= TimestampNs::ZERO);
        assert_eq!(events[3].confidence, 0.9);
        for e in events.iter() {
            assert!(e.t_wall_ns >= run.wall_start_time);
        }
        assert!(events[2].t_ns >= events[0].t_ns);
    }

    #[test]
    fn stop_closes_and_blocks_further_emission() {
        let dir = tempdir().unwrap();
        let mut runner = NodeRunner::new(config_in(dir.path()), "x.toml");
        let mut sink = MemoryEventSink::new();
        let open = sink.open_flag();
        runner.start(&mut sink).unwrap();
        runner.stop(&mut sink);
        runner.stop(&mut sink);

        assert!(!runner.is_running());
        assert!(!*open.lock().unwrap());
        assert_eq!(
            runner.emit_heartbeat(&mut sink, "late").unwrap_err().kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn start_prunes_before_opening() {
        let dir = tempdir().unwrap();
        for ns in 1..=4 {
            fs::write(dir.path().join(event_log_file_name(ns)), "{}\n").unwrap();
        }
        let mut cfg = config_in(dir.path());
        cfg.output.keep_last_runs = 2;

        let mut runner = NodeRunner::new(cfg, "x.toml");
        let mut sink = JsonlEventSink::new();
        runner.start(&mut sink).unwrap();
        runner.stop(&mut sink);

        let report = runner.last_prune().unwrap();
        assert_eq!(report.kept, 2);
        assert_eq!(report.removed.len(), 2);

        let mut names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        // two survivors, the new run, and the latest file
        assert_eq!(names.len(), 4);
        assert!(names.contains(&"events_3.jsonl".to_string()));
        assert!(names.contains(&"events_4.jsonl".to_string()));
        assert!(names.contains(&LATEST_FILE_NAME.to_string()));
    }
}
