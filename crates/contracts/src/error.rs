//! Layered error definitions
//!
//! Categorized by kind: config / argument / filesystem / data / internal.
//! End-of-stream is not an error; frame sources report it as `Ok(None)`.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Coarse error classification for programmatic matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed CLI/config value or misuse of an API argument
    InvalidArgument,
    /// Missing file or directory
    NotFound,
    /// Filesystem or write failure
    Io,
    /// Malformed structured input
    Parse,
    /// Well-formed input with an invalid size/shape
    CorruptData,
    /// Operation not implemented by this variant
    Unsupported,
    /// Invariant violated (e.g. emit before open)
    Internal,
}

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Caller Errors =====
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found: {0}")]
    NotFound(String),

    // ===== Environment Errors =====
    /// IO error with the path that caused it
    #[error("io error at '{}': {source}", path.display())]
    IoAt {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    // ===== Data Errors =====
    #[error("parse error: {0}")]
    Parse(String),

    #[error("corrupt data: {0}")]
    CorruptData(String),

    // ===== System Errors =====
    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Wrap an IO error with the path it happened on
    pub fn io_at(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::IoAt {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    pub fn corrupt_data(message: impl Into<String>) -> Self {
        Self::CorruptData(message.into())
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Error kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConfigParse { .. } | Self::Parse(_) => ErrorKind::Parse,
            Self::ConfigValidation { .. } | Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::IoAt { .. } | Self::Io(_) => ErrorKind::Io,
            Self::CorruptData(_) => ErrorKind::CorruptData,
            Self::Unsupported(_) => ErrorKind::Unsupported,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }
}
