//! `validate` command implementation.

use anyhow::Context;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;
use crate::commands::load_config;
use crate::error::Result;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    node_id: String,
    mode: String,
    input: String,
    out_dir: String,
    config_hash: String,
    calibration_hash: String,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let outcome = load_config(&args.config);
    let result = match &outcome {
        Ok(config) => ValidationResult {
            valid: true,
            config_path: args.config.display().to_string(),
            error: None,
            warnings: collect_warnings(config),
            summary: Some(ConfigSummary {
                node_id: config.node_id.clone(),
                mode: config.mode.to_string(),
                input: config.input.kind.as_str().to_string(),
                out_dir: config.output.out_dir.display().to_string(),
                config_hash: fingerprint::hash_config(config).to_string(),
                calibration_hash: fingerprint::hash_calibration(&config.calibration).to_string(),
            }),
        },
        Err(e) => ValidationResult {
            valid: false,
            config_path: args.config.display().to_string(),
            error: Some(e.to_string()),
            warnings: Vec::new(),
            summary: None,
        },
    };

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{json}");
    } else {
        print_validation_result(&result);
    }

    outcome.map(|_| ())
}

/// Non-fatal issues worth a hint
fn collect_warnings(config: &contracts::NodeConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.input.max_ticks == 0 && config.input.max_run_s == 0.0 {
        let eos_bound = config.input.kind == contracts::InputKind::FrameDir
            && !config.input.frame_dir.loop_playback;
        if !eos_bound {
            warnings.push("no max_ticks or max_run_s set - run ends only on a signal".to_string());
        }
    }

    if config.input.heartbeat_every_s == 0 {
        warnings.push("input.heartbeat_every_s is 0 - heartbeats disabled".to_string());
    }

    if config.calibration.calibration_path.as_os_str().is_empty() {
        warnings.push("calibration.calibration_path is empty".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Node: {}", summary.node_id);
            println!("  Mode: {}", summary.mode);
            println!("  Input: {}", summary.input);
            println!("  Output: {}", summary.out_dir);
            println!("  Config hash: {}", summary.config_hash);
            println!("  Calibration hash: {}", summary.calibration_hash);
        }

        if !result.warnings.is_empty() {
            println!("\n⚠ Warnings:");
            for warning in &result.warnings {
                println!("  - {warning}");
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {error}");
        }
    }
}
