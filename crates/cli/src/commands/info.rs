//! `info` command implementation.

use anyhow::Context;
use config_loader::ConfigLoader;
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;
use crate::commands::load_config;
use crate::error::{CliError, Result};

#[derive(Serialize)]
struct ConfigInfo<'a> {
    config_path: String,
    config_hash: String,
    calibration_hash: String,
    config: &'a contracts::NodeConfig,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    let config = load_config(&args.config)?;
    let config_hash = fingerprint::hash_config(&config);
    let calibration_hash = fingerprint::hash_calibration(&config.calibration);

    if args.json {
        let info = ConfigInfo {
            config_path: args.config.display().to_string(),
            config_hash: config_hash.to_string(),
            calibration_hash: calibration_hash.to_string(),
            config: &config,
        };
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{json}");
    } else {
        let toml = ConfigLoader::to_toml(&config)
            .map_err(|e| CliError::runtime("failed to render configuration", e))?;
        println!("# effective configuration: {}", args.config.display());
        println!("# config_hash = {config_hash}");
        println!("# calibration_hash = {calibration_hash}\n");
        print!("{toml}");
    }

    Ok(())
}
