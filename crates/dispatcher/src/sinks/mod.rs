//! Sink implementations
//!
//! Contains JsonlEventSink, LogEventSink, FanOutSink and MemoryEventSink.

mod fanout;
mod jsonl;
mod log;
mod memory;

pub use self::fanout::FanOutSink;
pub use self::jsonl::JsonlEventSink;
pub use self::log::LogEventSink;
pub use self::memory::MemoryEventSink;
