//! Command implementations.

mod info;
mod record;
mod run;
mod runs;
mod validate;

pub use info::run_info;
pub use record::run_record;
pub use run::run_node;
pub use runs::run_runs;
pub use validate::run_validate;

use std::path::Path;

use config_loader::ConfigLoader;
use contracts::NodeConfig;

use crate::error::{CliError, Result};

/// Load and validate, mapping failures to the configuration exit code
pub(crate) fn load_config(path: &Path) -> Result<NodeConfig> {
    ConfigLoader::load_from_path(path)
        .map_err(|e| CliError::config_load(path.display().to_string(), e))
}
