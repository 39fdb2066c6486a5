//! # Ingestion
//!
//! Frame sources for the node driver loop.
//!
//! Responsibilities:
//! - `SynthFrameSource`: deterministic synthetic scene (floor + optional obstacle)
//! - `FrameDirSource`: playback of a directory of binary frame files
//! - `FrameDirWriter`: record frames into that directory layout
//!
//! Both sources implement [`contracts::FrameSource`]. End-of-stream is
//! `Ok(None)`; looping is up to the caller via `reset()`.
//!
//! ## Usage Example
//!
//! ```ignore
//! use contracts::{FrameSource, NodeConfig};
//! use ingestion::source_from_config;
//!
//! let config = NodeConfig::default();
//! let mut source = source_from_config(&config.input);
//! source.open()?;
//! while let Some(frame) = source.next_frame()? {
//!     println!("{} {} points", frame.frame_id, frame.len());
//! }
//! source.close();
//! ```

mod factory;
mod frame_dir;
mod synth;
mod writer;

pub use factory::source_from_config;
pub use frame_dir::{FrameDirSource, FrameDirSourceConfig, FRAME_EXTENSION, MANIFEST_FILE};
pub use synth::{SynthFrameSource, SynthSourceConfig};
pub use writer::{FrameDirWriter, MAX_FRAMES};
