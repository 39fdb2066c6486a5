//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use contracts::RunMode;

/// wm-node - LiDAR edge node runtime
#[derive(Parser, Debug)]
#[command(
    name = "wm-node",
    author,
    version,
    about = "LiDAR edge node runtime",
    long_about = "Runs a LiDAR edge node: loads a layered configuration, fingerprints it,\n\
                  pulls frames from a synthetic or recorded source on a fixed tick and\n\
                  writes an append-only JSON-lines event log per run."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "WM_NODE_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "compact",
        global = true,
        env = "WM_NODE_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the node until a stop condition or a signal
    Run(RunArgs),

    /// Load and validate a configuration without running
    Validate(ValidateArgs),

    /// Print the effective (merged) configuration and its fingerprints
    Info(InfoArgs),

    /// List prior runs found in an output directory
    Runs(RunsArgs),

    /// Render synthetic frames into a frame directory
    Record(RecordArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, env = "WM_NODE_CONFIG")]
    pub config: PathBuf,

    /// Override the run mode
    #[arg(long, value_parser = parse_mode, env = "WM_NODE_MODE")]
    pub mode: Option<RunMode>,

    /// Override the dataset path (replay dataset and frame directory)
    #[arg(long, env = "WM_NODE_DATASET")]
    pub dataset: Option<PathBuf>,

    /// Override the output directory
    #[arg(long, env = "WM_NODE_OUT_DIR")]
    pub out_dir: Option<PathBuf>,

    /// Override the node id
    #[arg(long, env = "WM_NODE_NODE_ID")]
    pub node_id: Option<String>,

    /// Stop after this many ticks (overrides input.max_ticks)
    #[arg(long, env = "WM_NODE_MAX_TICKS")]
    pub max_ticks: Option<u64>,

    /// Mirror every event to the log output
    #[arg(long)]
    pub echo_events: bool,

    /// Prometheus metrics port (0 = disabled)
    #[arg(long, default_value = "0", env = "WM_NODE_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, env = "WM_NODE_CONFIG")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, env = "WM_NODE_CONFIG")]
    pub config: PathBuf,

    /// Output as JSON instead of TOML
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `runs` command
#[derive(Parser, Debug)]
pub struct RunsArgs {
    /// Output directory holding `events_<ns>.jsonl` files
    #[arg(long, default_value = "out", env = "WM_NODE_OUT_DIR")]
    pub out_dir: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `record` command
#[derive(Parser, Debug)]
pub struct RecordArgs {
    /// Configuration providing `input.synth` and `input.tick_hz`
    #[arg(short, long, env = "WM_NODE_CONFIG")]
    pub config: PathBuf,

    /// Frame directory to write
    #[arg(long)]
    pub out: PathBuf,

    /// Number of frames to render
    #[arg(long, default_value = "100")]
    pub frames: u64,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    Pretty,
    /// Compact single-line format
    #[default]
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

fn parse_mode(s: &str) -> Result<RunMode, String> {
    s.parse::<RunMode>().map_err(|e| e.to_string())
}
