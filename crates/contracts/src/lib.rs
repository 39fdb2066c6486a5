//! # Contracts
//!
//! Frozen interface contracts shared by every wm-node crate: the configuration
//! tree, geometry primitives, frames, events, and the two capability traits
//! (`EventSink`, `FrameSource`). Business crates depend on this crate only;
//! reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Logical time (`t_ns`): monotonic nanoseconds since run start, starts at 0
//! - Wall time (`t_wall_ns`): absolute epoch nanoseconds, used for cross-run
//!   correlation and log file naming
//!
//! ## Units
//! Distances in metres, durations as integer nanoseconds in memory (seconds in
//! configuration files).

mod config;
mod error;
mod event;
mod fingerprint;
mod frame;
mod frame_source;
mod geometry;
pub mod serde_seconds;
mod sink;
mod time;

pub use config::*;
pub use error::*;
pub use event::*;
pub use fingerprint::Fingerprint;
pub use frame::*;
pub use frame_source::FrameSource;
pub use geometry::*;
pub use sink::EventSink;
pub use time::*;
