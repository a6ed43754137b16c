//! Error types for CLI operations.

use std::time::Duration;

use contracts::ContractError;
use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Building the sink stack failed
    #[error("Failed to build sink stack: {0}")]
    SinkBuild(#[source] ContractError),

    /// A write failed with an error other than backpressure
    #[error("Write to {sink} failed after {lines} lines: {source}")]
    Write {
        sink: String,
        lines: u64,
        #[source]
        source: ContractError,
    },

    /// Graceful shutdown error
    #[error("Error during shutdown: {message}")]
    Shutdown { message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn shutdown(message: impl Into<String>) -> Self {
        Self::Shutdown {
            message: message.into(),
        }
    }

    /// Close did not finish within the shutdown timeout
    pub fn shutdown_timed_out(timeout: Duration, error: &ContractError) -> Self {
        Self::shutdown(format!(
            "sink did not close within {}s: {error}",
            timeout.as_secs()
        ))
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
