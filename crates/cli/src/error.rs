//! Error types for CLI operations.

use contracts::ContractError;
use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration could not be loaded, parsed or validated
    #[error("failed to load configuration '{path}': {source}")]
    ConfigLoad {
        path: String,
        #[source]
        source: ContractError,
    },

    /// A run lifecycle step failed (sink, source, driver loop)
    #[error("{context}: {source}")]
    Runtime {
        context: &'static str,
        #[source]
        source: ContractError,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error wrapper
    #[error("{0:#}")]
    Other(#[from] anyhow::Error),
}

impl CliError {
    pub fn config_load(path: impl Into<String>, source: ContractError) -> Self {
        Self::ConfigLoad {
            path: path.into(),
            source,
        }
    }

    pub fn runtime(context: &'static str, source: ContractError) -> Self {
        Self::Runtime { context, source }
    }

    /// Process exit code: 1 for configuration failures, 2 for anything else
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::ConfigLoad { .. } => 1,
            _ => 2,
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
