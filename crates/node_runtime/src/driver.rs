//! Paced driver loop
//!
//! Pulls one frame per tick from a `FrameSource` and reports through the
//! runner. Core calls stay synchronous; only pacing and the shutdown signal
//! are async, on a current-thread runtime.
//!
//! Per tick:
//! 1. Stop checks (max ticks, max runtime)
//! 2. Heartbeat when due, the first one on the first tick
//! 3. Pull a frame; on end-of-stream rewind (looping) or stop
//! 4. `frame_stats` every Nth frame, then flush
//! 5. Sleep to the next boundary; an overrun resynchronizes to now + period

use std::future::Future;
use std::time::Duration;

use contracts::{
    event_types, hz_to_period_ns, ContractError, EventSink, FrameSource, NodeConfig, RunMode,
};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::runner::NodeRunner;
use crate::stats::{RunStats, StopReason};

/// Loop parameters
#[derive(Debug, Clone, PartialEq)]
pub struct LoopConfig {
    pub tick_period: Duration,
    /// `None` disables heartbeats
    pub heartbeat_every: Option<Duration>,
    pub max_ticks: Option<u64>,
    pub max_run: Option<Duration>,
    /// Rewind the source on end-of-stream instead of stopping
    pub loop_on_eos: bool,
    /// Emit `frame_stats` for every Nth frame (>= 1)
    pub frame_stats_every: u64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self::from_node_config(&NodeConfig::default())
    }
}

impl LoopConfig {
    pub fn from_node_config(config: &NodeConfig) -> Self {
        let input = &config.input;
        let period_ns = u64::try_from(hz_to_period_ns(input.tick_hz)).unwrap_or(1).max(1);

        let loop_on_eos = input.frame_dir.loop_playback
            || (config.mode == RunMode::Replay && config.replay.loop_playback);

        Self {
            tick_period: Duration::from_nanos(period_ns),
            heartbeat_every: u64::try_from(input.heartbeat_every_s)
                .ok()
                .filter(|&s| s > 0)
                .map(Duration::from_secs),
            max_ticks: u64::try_from(input.max_ticks).ok().filter(|&n| n > 0),
            // past the Duration range the limit can never be reached
            max_run: (input.max_run_s.is_finite() && input.max_run_s > 0.0).then(|| {
                Duration::try_from_secs_f64(input.max_run_s).unwrap_or(Duration::MAX)
            }),
            loop_on_eos,
            frame_stats_every: u64::from(config.output.frame_stats_every.max(1)),
        }
    }
}

/// Paced driver loop
#[derive(Debug, Clone)]
pub struct DriveLoop {
    config: LoopConfig,
}

impl DriveLoop {
    pub fn new(config: LoopConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    /// Run until a stop condition, end-of-stream, `shutdown` or an error.
    ///
    /// The runner must be started. The caller owns cleanup: it closes the
    /// source and stops the runner on every exit path, including `Err`.
    pub async fn run<S, F, Sh>(
        &self,
        runner: &NodeRunner,
        sink: &mut S,
        source: &mut F,
        shutdown: Sh,
    ) -> Result<RunStats, ContractError>
    where
        S: EventSink + ?Sized,
        F: FrameSource + ?Sized,
        Sh: Future<Output = ()>,
    {
        if !runner.is_running() {
            return Err(ContractError::internal("driver loop needs a started runner"));
        }
        tokio::pin!(shutdown);

        let cfg = &self.config;
        let period = cfg.tick_period;
        let mut stats = RunStats::new();

        let t_start = Instant::now();
        let mut next_tick = t_start + period;
        let mut last_heartbeat: Option<Instant> = None;

        debug!(
            source = source.name(),
            sink = sink.name(),
            period_ms = period.as_secs_f64() * 1e3,
            "driver loop started"
        );

        let reason = loop {
            let now = Instant::now();

            if cfg.max_ticks.is_some_and(|max| stats.ticks >= max) {
                break StopReason::MaxTicks;
            }
            if cfg.max_run.is_some_and(|max| now - t_start >= max) {
                break StopReason::MaxRuntime;
            }

            if let Some(every) = cfg.heartbeat_every {
                if last_heartbeat.map_or(true, |t| now - t >= every) {
                    last_heartbeat = Some(now);
                    runner.emit_heartbeat(sink, &format!("alive tick={}", stats.ticks))?;
                    stats.heartbeats += 1;
                    observability::record_heartbeat();
                }
            }

            let mut frame = source.next_frame()?;
            if frame.is_none() && cfg.loop_on_eos {
                source.reset()?;
                stats.loops += 1;
                observability::record_input_loop();
                runner.emit_event(
                    sink,
                    event_types::INPUT_LOOP,
                    &format!("input rewound loop={}", stats.loops),
                )?;
                frame = source.next_frame()?;
            }
            let Some(frame) = frame else {
                break StopReason::EndOfStream;
            };

            stats.frames += 1;
            stats.points += frame.len() as u64;
            observability::record_frame(frame.len());
            if (stats.frames - 1) % cfg.frame_stats_every == 0 {
                runner.emit_event(
                    sink,
                    event_types::FRAME_STATS,
                    &format!(
                        "frame_id={} num_points={} t_ns={}",
                        frame.frame_id,
                        frame.len(),
                        frame.t_ns.as_nanos()
                    ),
                )?;
            }

            sink.flush()?;
            stats.ticks += 1;
            observability::record_tick(stats.ticks);

            let after = Instant::now();
            let work_ms = (after - now).as_secs_f64() * 1e3;
            stats.tick_work_ms.push(work_ms);
            observability::record_tick_work_ms(work_ms);

            let wake = if after < next_tick {
                let wake = next_tick;
                next_tick += period;
                wake
            } else {
                stats.overruns += 1;
                observability::record_tick_overrun();
                next_tick = after + period;
                after
            };

            let signalled = tokio::select! {
                biased;
                () = &mut shutdown => true,
                () = sleep_until(wake) => false,
            };
            if signalled {
                break StopReason::Signal;
            }
        };

        let kind = match reason {
            StopReason::EndOfStream => event_types::INPUT_EOF,
            _ => event_types::SHUTDOWN,
        };
        if let Err(e) = runner
            .emit_event(sink, kind, reason.message())
            .and_then(|()| sink.flush())
        {
            warn!(error = %e, reason = %reason, "failed to record loop exit");
        }

        stats.stop_reason = reason;
        stats.elapsed = t_start.elapsed();
        info!(
            reason = %reason,
            ticks = stats.ticks,
            frames = stats.frames,
            loops = stats.loops,
            overruns = stats.overruns,
            "driver loop finished"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ErrorKind, Event, Frame, InputKind, PointXyzi, TimestampNs};
    use dispatcher::MemoryEventSink;
    use ingestion::{source_from_config, FrameDirSource, FrameDirSourceConfig, FrameDirWriter};
    use std::future::{pending, ready};
    use std::path::Path;
    use tempfile::tempdir;

    fn fast_loop() -> LoopConfig {
        LoopConfig {
            tick_period: Duration::from_millis(1),
            heartbeat_every: Some(Duration::from_secs(60)),
            max_ticks: None,
            max_run: None,
            loop_on_eos: false,
            frame_stats_every: 1,
        }
    }

    fn started(out_dir: &Path) -> (NodeRunner, MemoryEventSink) {
        let mut cfg = NodeConfig::default();
        cfg.output.out_dir = out_dir.to_path_buf();
        let mut runner = NodeRunner::new(cfg, "node.toml");
        let mut sink = MemoryEventSink::new();
        runner.start(&mut sink).unwrap();
        (runner, sink)
    }

    fn synth_source() -> Box<dyn FrameSource> {
        let mut cfg = NodeConfig::default();
        cfg.input.kind = InputKind::Synth;
        cfg.input.synth.num_points = 16;
        let mut src = source_from_config(&cfg.input);
        src.open().unwrap();
        src
    }

    fn frame_dir_with(dir: &Path, n: usize) -> FrameDirSource {
        let mut writer = FrameDirWriter::create(dir).unwrap();
        for i in 0..n {
            let points = vec![PointXyzi::new(i as f32, 0.0, 0.0, 1.0); i + 1];
            let t = TimestampNs::from_nanos(i as i64 * 100_000_000);
            writer
                .write_frame(&Frame::new(t, format!("f{i}"), points))
                .unwrap();
        }
        writer.finish().unwrap();
        let mut src = FrameDirSource::new(FrameDirSourceConfig::new(dir, 10.0));
        src.open().unwrap();
        src
    }

    fn snapshot(sink: &MemoryEventSink) -> Vec<Event> {
        sink.events().lock().unwrap().clone()
    }

    #[tokio::test]
    async fn stops_at_max_ticks() {
        let dir = tempdir().unwrap();
        let (mut runner, mut sink) = started(dir.path());
        let mut source = synth_source();

        let drive = DriveLoop::new(LoopConfig {
            max_ticks: Some(5),
            ..fast_loop()
        });
        let stats = drive
            .run(&runner, &mut sink, source.as_mut(), pending())
            .await
            .unwrap();

        assert_eq!(stats.stop_reason, StopReason::MaxTicks);
        assert_eq!(stats.ticks, 5);
        assert_eq!(stats.frames, 5);
        assert_eq!(stats.points, 5 * 16);
        assert_eq!(stats.heartbeats, 1);

        let events = snapshot(&sink);
        let kinds: Vec<&str> = events.iter().map(|e| e.kind.as_str()).collect();
        assert_eq!(
            kinds,
            vec![
                "heartbeat",
                "frame_stats",
                "frame_stats",
                "frame_stats",
                "frame_stats",
                "frame_stats",
                "shutdown"
            ]
        );
        assert_eq!(events[0].message, "alive tick=0");
        assert_eq!(
            events[2].message,
            "frame_id=synth_1 num_points=16 t_ns=100000000"
        );
        assert_eq!(events[6].message, "max_ticks reached");

        source.close();
        runner.stop(&mut sink);
    }

    #[tokio::test]
    async fn end_of_stream_without_loop_stops() {
        let dir = tempdir().unwrap();
        let (mut runner, mut sink) = started(&dir.path().join("out"));
        let mut source = frame_dir_with(&dir.path().join("frames"), 3);

        let stats = DriveLoop::new(fast_loop())
            .run(&runner, &mut sink, &mut source, pending())
            .await
            .unwrap();

        assert_eq!(stats.stop_reason, StopReason::EndOfStream);
        assert_eq!(stats.frames, 3);
        assert_eq!(stats.points, 1 + 2 + 3);
        assert_eq!(stats.loops, 0);

        let events = snapshot(&sink);
        let last = events.last().unwrap();
        assert_eq!(last.kind, "input_eof");
        assert_eq!(last.message, "input source reached end");
        assert!(events[1].message.starts_with("frame_id=000000.bin"));

        // end-of-stream stays end-of-stream
        assert!(source.next_frame().unwrap().is_none());
        assert!(source.next_frame().unwrap().is_none());

        source.close();
        runner.stop(&mut sink);
    }

    #[tokio::test]
    async fn looping_rewinds_the_source() {
        let dir = tempdir().unwrap();
        let (mut runner, mut sink) = started(&dir.path().join("out"));
        let mut source = frame_dir_with(&dir.path().join("frames"), 3);

        let stats = DriveLoop::new(LoopConfig {
            max_ticks: Some(7),
            loop_on_eos: true,
            ..fast_loop()
        })
        .run(&runner, &mut sink, &mut source, pending())
        .await
        .unwrap();

        assert_eq!(stats.stop_reason, StopReason::MaxTicks);
        assert_eq!(stats.frames, 7);
        assert_eq!(stats.loops, 2);

        let events = snapshot(&sink);
        let loops: Vec<&Event> = events.iter().filter(|e| e.kind == "input_loop").collect();
        assert_eq!(loops.len(), 2);
        assert_eq!(loops[1].message, "input rewound loop=2");

        // logical frame timestamps keep increasing across passes
        let t_values: Vec<i64> = events
            .iter()
            .filter(|e| e.kind == "frame_stats")
            .map(|e| {
                e.message
                    .rsplit("t_ns=")
                    .next()
                    .unwrap()
                    .parse::<i64>()
                    .unwrap()
            })
            .collect();
        assert_eq!(t_values.len(), 7);
        assert!(t_values.windows(2).all(|w| w[0] < w[1]), "{t_values:?}");

        source.close();
        runner.stop(&mut sink);
    }

    #[tokio::test]
    async fn frame_stats_decimation() {
        let dir = tempdir().unwrap();
        let (mut runner, mut sink) = started(dir.path());
        let mut source = synth_source();

        DriveLoop::new(LoopConfig {
            max_ticks: Some(5),
            frame_stats_every: 2,
            heartbeat_every: None,
            ..fast_loop()
        })
        .run(&runner, &mut sink, source.as_mut(), pending())
        .await
        .unwrap();

        let stats_ids: Vec<String> = snapshot(&sink)
            .into_iter()
            .filter(|e| e.kind == "frame_stats")
            .map(|e| e.message)
            .collect();
        assert_eq!(stats_ids.len(), 3);
        assert!(stats_ids[0].starts_with("frame_id=synth_0 "));
        assert!(stats_ids[1].starts_with("frame_id=synth_2 "));
        assert!(stats_ids[2].starts_with("frame_id=synth_4 "));
        assert!(!sink.kinds().contains(&"heartbeat".to_string()));

        runner.stop(&mut sink);
    }

    #[tokio::test]
    async fn heartbeats_follow_their_period() {
        let dir = tempdir().unwrap();
        let (mut runner, mut sink) = started(dir.path());
        let mut source = synth_source();

        let stats = DriveLoop::new(LoopConfig {
            tick_period: Duration::from_millis(5),
            heartbeat_every: Some(Duration::from_millis(20)),
            max_run: Some(Duration::from_millis(200)),
            ..fast_loop()
        })
        .run(&runner, &mut sink, source.as_mut(), pending())
        .await
        .unwrap();

        assert_eq!(stats.stop_reason, StopReason::MaxRuntime);
        assert!(stats.heartbeats >= 2, "heartbeats: {}", stats.heartbeats);
        assert!(stats.heartbeats < stats.ticks);
        assert_eq!(sink.kinds().first().map(String::as_str), Some("heartbeat"));

        let events = snapshot(&sink);
        assert_eq!(events.last().unwrap().message, "max_runtime reached");

        runner.stop(&mut sink);
    }

    #[tokio::test]
    async fn shutdown_signal_ends_the_loop() {
        let dir = tempdir().unwrap();
        let (mut runner, mut sink) = started(dir.path());
        let mut source = synth_source();

        let stats = DriveLoop::new(fast_loop())
            .run(&runner, &mut sink, source.as_mut(), ready(()))
            .await
            .unwrap();

        assert_eq!(stats.stop_reason, StopReason::Signal);
        assert_eq!(stats.ticks, 1);
        let events = snapshot(&sink);
        let last = events.last().unwrap();
        assert_eq!(last.kind, "shutdown");
        assert_eq!(last.message, "signal received");

        runner.stop(&mut sink);
    }

    #[tokio::test]
    async fn sink_failure_propagates() {
        let dir = tempdir().unwrap();
        let mut cfg = NodeConfig::default();
        cfg.output.out_dir = dir.path().to_path_buf();
        let mut runner = NodeRunner::new(cfg, "node.toml");
        let mut sink = MemoryEventSink::new().fail_emit_after(2);
        runner.start(&mut sink).unwrap();
        let mut source = synth_source();

        let err = DriveLoop::new(fast_loop())
            .run(&runner, &mut sink, source.as_mut(), pending())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);

        runner.stop(&mut sink);
    }

    #[tokio::test]
    async fn requires_started_runner() {
        let runner = NodeRunner::new(NodeConfig::default(), "node.toml");
        let mut sink = MemoryEventSink::new();
        let mut source = synth_source();
        let err = DriveLoop::new(fast_loop())
            .run(&runner, &mut sink, source.as_mut(), pending())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn loop_config_from_node_config() {
        let mut cfg = NodeConfig::default();
        let lc = LoopConfig::from_node_config(&cfg);
        assert_eq!(lc.tick_period, Duration::from_millis(100));
        assert_eq!(lc.heartbeat_every, Some(Duration::from_secs(5)));
        assert_eq!(lc.max_ticks, None);
        assert_eq!(lc.max_run, None);
        assert!(!lc.loop_on_eos);
        assert_eq!(lc.frame_stats_every, 1);

        cfg.input.tick_hz = 4.0;
        cfg.input.heartbeat_every_s = 0;
        cfg.input.max_ticks = 12;
        cfg.input.max_run_s = 1.5;
        cfg.input.frame_dir.loop_playback = true;
        cfg.output.frame_stats_every = 3;
        let lc = LoopConfig::from_node_config(&cfg);
        assert_eq!(lc.tick_period, Duration::from_millis(250));
        assert_eq!(lc.heartbeat_every, None);
        assert_eq!(lc.max_ticks, Some(12));
        assert_eq!(lc.max_run, Some(Duration::from_millis(1500)));
        assert!(lc.loop_on_eos);
        assert_eq!(lc.frame_stats_every, 3);
    }

    #[test]
    fn huge_max_run_saturates() {
        let mut cfg = NodeConfig::default();
        cfg.input.max_run_s = 1e20;
        let lc = LoopConfig::from_node_config(&cfg);
        assert_eq!(lc.max_run, Some(Duration::MAX));

        cfg.input.max_run_s = f64::MAX;
        assert_eq!(LoopConfig::from_node_config(&cfg).max_run, Some(Duration::MAX));
    }

    #[test]
    fn replay_loop_flag_enables_looping() {
        let mut cfg = NodeConfig::default();
        cfg.mode = RunMode::Replay;
        cfg.replay.loop_playback = true;
        assert!(LoopConfig::from_node_config(&cfg).loop_on_eos);

        cfg.mode = RunMode::Live;
        assert!(!LoopConfig::from_node_config(&cfg).loop_on_eos);
    }
}
