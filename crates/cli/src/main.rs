//! # wm-node CLI
//!
//! Command-line entry point.
//!
//! Provides:
//! - Configuration loading, validation and inspection
//! - Node runs with graceful shutdown
//! - Run listing and synthetic frame recording

mod cli;
mod commands;
mod error;

use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use tracing::debug;

use cli::{Cli, Commands};
use commands::{run_info, run_node, run_record, run_runs, run_validate};
use error::Result;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli) {
        eprintln!("error: {e:#}");
        return ExitCode::from(2);
    }

    debug!(version = env!("CARGO_PKG_VERSION"), "wm-node starting");

    let result = match &cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
        Commands::Runs(args) => run_runs(args),
        Commands::Record(args) => run_record(args),
    };

    ExitCode::from(report(result, &mut io::stderr().lock()))
}

/// Exit status of the command outcome; a failure writes one message to `out`.
fn report(result: Result<()>, out: &mut impl Write) -> u8 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            debug!(error = ?e, "command failed");
            let _ = writeln!(out, "error: {e}");
            e.exit_code()
        }
    }
}

/// Initialize logging based on CLI options
fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let default_log_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    observability::init_with_config(observability::ObservabilityConfig {
        log_format: cli.log_format.into(),
        metrics_port: None,
        default_log_level: default_log_level.to_string(),
    })
}
