//! EventSink trait - runner output interface
//!
//! Defines the abstract interface for event sinks.

use crate::{ContractError, Event, RunInfo};

/// Event output trait
///
/// State machine: Closed → Open → Closed. All sink implementations must
/// implement this trait.
pub trait EventSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Start a session for `run`, closing any existing one first.
    ///
    /// # Errors
    /// Returns an IO error if the output cannot be created.
    fn open(&mut self, run: &RunInfo) -> Result<(), ContractError>;

    /// Write one event.
    ///
    /// # Errors
    /// `Internal` when called outside an open session, IO error on write
    /// failure. Failed writes are not retried.
    fn emit(&mut self, event: &Event) -> Result<(), ContractError>;

    /// Flush buffers. A no-op success when no session is open.
    fn flush(&mut self) -> Result<(), ContractError>;

    /// Best-effort flush and release. Safe to call repeatedly.
    fn close(&mut self);

    /// Whether a session is open.
    fn is_open(&self) -> bool;
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn open(&mut self, run: &RunInfo) -> Result<(), ContractError> {
        (**self).open(run)
    }

    fn emit(&mut self, event: &Event) -> Result<(), ContractError> {
        (**self).emit(event)
    }

    fn flush(&mut self) -> Result<(), ContractError> {
        (**self).flush()
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }
}
