//! Scalar overrides applied on top of a loaded configuration.

use std::path::PathBuf;

use contracts::{NodeConfig, RunMode};

/// Command-line overrides. `None` leaves the loaded value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub mode: Option<RunMode>,
    /// Sets both `replay.dataset_path` and `input.frame_dir.path`
    pub dataset_path: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
    pub node_id: Option<String>,
}

impl ConfigOverrides {
    pub fn is_empty(&self) -> bool {
        self.mode.is_none()
            && self.dataset_path.is_none()
            && self.out_dir.is_none()
            && self.node_id.is_none()
    }

    /// Apply to `cfg`. The caller re-validates afterwards.
    pub fn apply(&self, cfg: &mut NodeConfig) {
        if let Some(mode) = self.mode {
            cfg.mode = mode;
        }
        if let Some(path) = &self.dataset_path {
            cfg.replay.dataset_path = path.clone();
            cfg.input.frame_dir.path = path.clone();
        }
        if let Some(out_dir) = &self.out_dir {
            cfg.output.out_dir = out_dir.clone();
        }
        if let Some(node_id) = &self.node_id {
            cfg.node_id = node_id.clone();
        }
    }
}
