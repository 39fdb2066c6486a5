//! # Node Runtime
//!
//! Run lifecycle of a wm-node process.
//!
//! - [`NodeRunner`]: time origin, fingerprints, event emission
//! - [`prune_event_logs`]: keeps the output directory bounded
//! - [`DriveLoop`]: paced frame loop with heartbeats and stop conditions
//!
//! ## Usage
//!
//! ```ignore
//! let mut runner = NodeRunner::new(config.clone(), config_path);
//! let mut sink = JsonlEventSink::new();
//! runner.start(&mut sink)?;
//!
//! let mut source = ingestion::source_from_config(&config.input);
//! source.open()?;
//! let result = DriveLoop::new(LoopConfig::from_node_config(&config))
//!     .run(&runner, &mut sink, source.as_mut(), shutdown)
//!     .await;
//!
//! source.close();
//! runner.stop(&mut sink);
//! ```

pub mod driver;
pub mod prune;
pub mod runner;
pub mod stats;

pub use driver::{DriveLoop, LoopConfig};
pub use prune::{prune_event_logs, PruneReport};
pub use runner::{wall_now, NodeRunner};
pub use stats::{RunStats, StopReason};
