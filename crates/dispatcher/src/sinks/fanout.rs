//! FanOutSink - one event, several sinks

use contracts::{ContractError, Event, EventSink, RunInfo};
use tracing::warn;

/// Forwards every call to each child sink in order.
///
/// `open` is all-or-nothing: if a child fails, the children already opened
/// are closed again. `emit` and `flush` reach every child and report the
/// first error.
pub struct FanOutSink {
    sinks: Vec<Box<dyn EventSink>>,
}

impl FanOutSink {
    pub fn new(sinks: Vec<Box<dyn EventSink>>) -> Self {
        Self { sinks }
    }

    pub fn push(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    fn for_each(
        &mut self,
        mut op: impl FnMut(&mut Box<dyn EventSink>) -> Result<(), ContractError>,
    ) -> Result<(), ContractError> {
        let mut first_err = None;
        for sink in &mut self.sinks {
            if let Err(e) = op(sink) {
                warn!(sink = sink.name(), error = %e, "fan-out child failed");
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

impl EventSink for FanOutSink {
    fn name(&self) -> &str {
        "fanout"
    }

    fn open(&mut self, run: &RunInfo) -> Result<(), ContractError> {
        for idx in 0..self.sinks.len() {
            if let Err(e) = self.sinks[idx].open(run) {
                for opened in &mut self.sinks[..idx] {
                    opened.close();
                }
                return Err(e);
            }
        }
        Ok(())
    }

    fn emit(&mut self, event: &Event) -> Result<(), ContractError> {
        self.for_each(|sink| sink.emit(event))
    }

    fn flush(&mut self) -> Result<(), ContractError> {
        self.for_each(|sink| sink.flush())
    }

    fn close(&mut self) {
        for sink in &mut self.sinks {
            sink.close();
        }
    }

    fn is_open(&self) -> bool {
        self.sinks.iter().any(|s| s.is_open())
    }
}
