//! MemoryEventSink - keeps events in memory

use std::sync::{Arc, Mutex, MutexGuard};

use contracts::{ContractError, Event, EventSink, RunInfo};

type Shared<T> = Arc<Mutex<T>>;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Sink recording runs and events behind shared handles, so a caller can
/// inspect them after the sink has been moved into a runner or a fan-out.
///
/// Failure injection (`fail_open`, `fail_emit_after`) lets drivers exercise
/// their error paths.
#[derive(Default)]
pub struct MemoryEventSink {
    runs: Shared<Vec<RunInfo>>,
    events: Shared<Vec<Event>>,
    open: Shared<bool>,
    fail_open: bool,
    fail_emit_after: Option<usize>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    /// Accept `n` events, then fail every later `emit` with an IO error.
    pub fn fail_emit_after(mut self, n: usize) -> Self {
        self.fail_emit_after = Some(n);
        self
    }

    pub fn events(&self) -> Shared<Vec<Event>> {
        Arc::clone(&self.events)
    }

    pub fn runs(&self) -> Shared<Vec<RunInfo>> {
        Arc::clone(&self.runs)
    }

    pub fn open_flag(&self) -> Shared<bool> {
        Arc::clone(&self.open)
    }

    /// Event type tags recorded so far
    pub fn kinds(&self) -> Vec<String> {
        lock(&self.events).iter().map(|e| e.kind.clone()).collect()
    }
}

impl EventSink for MemoryEventSink {
    fn name(&self) -> &str {
        "memory"
    }

    fn open(&mut self, run: &RunInfo) -> Result<(), ContractError> {
        self.close();
        if self.fail_open {
            return Err(ContractError::io_at(
                &run.out_dir,
                std::io::Error::other("injected open failure"),
            ));
        }
        lock(&self.runs).push(run.clone());
        *lock(&self.open) = true;
        Ok(())
    }

    fn emit(&mut self, event: &Event) -> Result<(), ContractError> {
        if !*lock(&self.open) {
            return Err(ContractError::internal("emit on closed sink 'memory'"));
        }
        let mut events = lock(&self.events);
        if self.fail_emit_after.is_some_and(|n| events.len() >= n) {
            return Err(ContractError::Io(std::io::Error::other(
                "injected emit failure",
            )));
        }
        events.push(event.clone());
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    fn close(&mut self) {
        *lock(&self.open) = false;
    }

    fn is_open(&self) -> bool {
        *lock(&self.open)
    }
}
