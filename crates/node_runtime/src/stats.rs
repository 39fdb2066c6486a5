//! Run statistics

use std::fmt;
use std::time::Duration;

use observability::RunningStats;

/// Why the driver loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    MaxTicks,
    MaxRuntime,
    /// Source ended and looping is off
    EndOfStream,
    /// External shutdown (Ctrl-C / SIGTERM)
    Signal,
}

impl StopReason {
    /// Message carried by the terminating event
    pub fn message(self) -> &'static str {
        match self {
            Self::MaxTicks => "max_ticks reached",
            Self::MaxRuntime => "max_runtime reached",
            Self::EndOfStream => "input source reached end",
            Self::Signal => "signal received",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::MaxTicks => "max_ticks",
            Self::MaxRuntime => "max_runtime",
            Self::EndOfStream => "end_of_stream",
            Self::Signal => "signal",
        };
        f.write_str(s)
    }
}

/// Statistics from one driver loop
#[derive(Debug, Clone)]
pub struct RunStats {
    /// Completed ticks
    pub ticks: u64,
    pub frames: u64,
    pub points: u64,
    pub heartbeats: u64,
    /// Source rewinds after end-of-stream
    pub loops: u64,
    /// Ticks whose work overran the period
    pub overruns: u64,
    pub stop_reason: StopReason,
    pub elapsed: Duration,
    /// Per-tick work time (ms), excluding the pacing sleep
    pub tick_work_ms: RunningStats,
}

impl RunStats {
    pub(crate) fn new() -> Self {
        Self {
            ticks: 0,
            frames: 0,
            points: 0,
            heartbeats: 0,
            loops: 0,
            overruns: 0,
            stop_reason: StopReason::MaxTicks,
            elapsed: Duration::ZERO,
            tick_work_ms: RunningStats::default(),
        }
    }

    /// Frames per second of wall time
    pub fn fps(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.frames as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Overruns as a percentage of ticks
    pub fn overrun_rate(&self) -> f64 {
        if self.ticks > 0 {
            (self.overruns as f64 / self.ticks as f64) * 100.0
        } else {
            0.0
        }
    }

    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                        Run Statistics                        ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        print!("{self}");
        println!();
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Overview")?;
        writeln!(f, "   ├─ Stop reason: {}", self.stop_reason)?;
        writeln!(f, "   ├─ Duration: {:.2}s", self.elapsed.as_secs_f64())?;
        writeln!(f, "   ├─ Ticks: {}", self.ticks)?;
        writeln!(f, "   ├─ Frames: {}", self.frames)?;
        writeln!(f, "   ├─ Points: {}", self.points)?;
        writeln!(f, "   └─ FPS: {:.2}", self.fps())?;
        writeln!(f, "Loop")?;
        writeln!(f, "   ├─ Heartbeats: {}", self.heartbeats)?;
        writeln!(f, "   ├─ Input loops: {}", self.loops)?;
        writeln!(
            f,
            "   ├─ Overruns: {} ({:.2}%)",
            self.overruns,
            self.overrun_rate()
        )?;
        writeln!(f, "   └─ Tick work (ms): {}", self.tick_work_ms.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_and_rates() {
        let mut stats = RunStats::new();
        assert_eq!(stats.fps(), 0.0);
        assert_eq!(stats.overrun_rate(), 0.0);

        stats.frames = 50;
        stats.ticks = 50;
        stats.overruns = 5;
        stats.elapsed = Duration::from_secs(5);
        assert!((stats.fps() - 10.0).abs() < 1e-9);
        assert!((stats.overrun_rate() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn summary_mentions_stop_reason() {
        let mut stats = RunStats::new();
        stats.stop_reason = StopReason::EndOfStream;
        let text = stats.to_string();
        assert!(text.contains("Stop reason: end_of_stream"), "got: {text}");
        assert!(text.contains("Tick work (ms): N/A"));
    }

    #[test]
    fn stop_messages() {
        assert_eq!(StopReason::MaxTicks.message(), "max_ticks reached");
        assert_eq!(StopReason::MaxRuntime.message(), "max_runtime reached");
        assert_eq!(StopReason::Signal.message(), "signal received");
    }
}
