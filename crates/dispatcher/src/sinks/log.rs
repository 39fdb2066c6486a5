//! LogEventSink - mirrors events into tracing

use contracts::{ContractError, Event, EventSink, RunInfo};
use tracing::{info, instrument};

/// Sink that logs event summaries, for `--echo-events` and debugging
pub struct LogEventSink {
    name: String,
    node_id: Option<String>,
}

impl LogEventSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            node_id: None,
        }
    }
}

impl EventSink for LogEventSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&mut self, run: &RunInfo) -> Result<(), ContractError> {
        info!(
            sink = %self.name,
            node_id = %run.node_id,
            config_hash = %run.config_hash,
            calibration_hash = %run.calibration_hash,
            wall_start_ns = run.wall_start_time.as_nanos(),
            "run_started"
        );
        self.node_id = Some(run.node_id.clone());
        Ok(())
    }

    #[instrument(name = "log_sink_emit", level = "trace", skip(self, event))]
    fn emit(&mut self, event: &Event) -> Result<(), ContractError> {
        let Some(node_id) = &self.node_id else {
            return Err(ContractError::internal(format!(
                "emit on closed sink '{}'",
                self.name
            )));
        };
        info!(
            sink = %self.name,
            node_id = %node_id,
            kind = %event.kind,
            t_s = %event.t_ns.format_secs(),
            message = %event.message,
            "event"
        );
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    fn close(&mut self) {
        if self.node_id.take().is_some() {
            info!(sink = %self.name, "LogEventSink closed");
        }
    }

    fn is_open(&self) -> bool {
        self.node_id.is_some()
    }
}
