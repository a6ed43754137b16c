//! Layered error definitions
//!
//! Categorized by source: config / lifecycle / backpressure / cancellation / io

use thiserror::Error;

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

    /// File sink constructed without a path
    #[error("empty path")]
    EmptyPath,

    // ===== Lifecycle Errors =====
    /// Operation attempted after close
    #[error("closed")]
    Closed,

    // ===== Backpressure Errors =====
    /// Bounded queue full under drop/shed backpressure
    #[error("queue full")]
    QueueFull,

    // ===== Cancellation Errors =====
    /// Context was cancelled
    #[error("context cancelled")]
    Cancelled,

    /// Context deadline passed
    #[error("context deadline exceeded")]
    DeadlineExceeded,

    // ===== Sink Errors =====
    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
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

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    pub fn is_queue_full(&self) -> bool {
        matches!(self, Self::QueueFull)
    }

    /// True for the context's own errors
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }

    /// Whether repeating the same operation could succeed
    ///
    /// Lifecycle, backpressure, cancellation and configuration errors are
    /// final; I/O and delivery failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::SinkWrite { .. })
    }
}
