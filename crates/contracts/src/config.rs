//! LogsinkConfig - Config Loader output
//!
//! Describes one file sink and the optional layers composed around it.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::{Backpressure, BatchPolicy, RetryPolicy, RotationPolicy, DEFAULT_QUEUE_CAPACITY};

/// Default permission bits for created log files
pub const DEFAULT_FILE_MODE: u32 = 0o640;

/// Config version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsinkConfig {
    #[serde(default)]
    pub version: ConfigVersion,

    /// Sink stack
    pub sink: SinkConfig,

    /// Logging/metrics of the process itself
    #[serde(default)]
    pub observability: ObservabilitySettings,
}

/// One rotating file sink plus optional retry and batching layers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Name override for the file sink (default `file(<basename>)`)
    #[serde(default)]
    pub name: Option<String>,

    /// Active log file path
    #[serde(default)]
    pub path: PathBuf,

    /// Permission bits for created files
    #[serde(default)]
    pub file_mode: Option<u32>,

    #[serde(default)]
    pub rotation: RotationPolicy,

    /// Async batching layer (absent = writes go straight to the file)
    #[serde(default)]
    pub batch: Option<BatchConfig>,

    /// Retry layer around the file sink
    #[serde(default)]
    pub retry: Option<RetryPolicy>,
}

impl SinkConfig {
    pub fn effective_file_mode(&self) -> u32 {
        match self.file_mode {
            Some(mode) if mode != 0 => mode,
            _ => DEFAULT_FILE_MODE,
        }
    }

    /// Retry policy when one is configured and enabled
    pub fn enabled_retry(&self) -> Option<RetryPolicy> {
        self.retry.filter(|r| r.enable)
    }
}

/// Batching layer configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Queue capacity (0 or negative = default)
    #[serde(default)]
    pub queue_capacity: i64,

    /// Count trigger (0 or negative = none)
    #[serde(default)]
    pub max_entries: i64,

    #[serde(default)]
    pub interval_ms: u64,

    #[serde(default)]
    pub backpressure: Backpressure,

    /// Name override for the batching layer (default `batch(<inner>)`)
    #[serde(default)]
    pub name: Option<String>,
}

impl BatchConfig {
    pub fn effective_queue_capacity(&self) -> usize {
        usize::try_from(self.queue_capacity)
            .ok()
            .filter(|capacity| *capacity > 0)
            .unwrap_or(DEFAULT_QUEUE_CAPACITY)
    }

    pub fn policy(&self) -> BatchPolicy {
        BatchPolicy {
            max_entries: usize::try_from(self.max_entries).unwrap_or(0),
            interval_ms: self.interval_ms,
        }
    }
}

/// Process logging/metrics settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilitySettings {
    #[serde(default)]
    pub log_format: LogFormat,

    /// Prometheus exporter port (absent = disabled)
    #[serde(default)]
    pub metrics_port: Option<u16>,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilitySettings {
    fn default() -> Self {
        Self {
            log_format: LogFormat::default(),
            metrics_port: None,
            log_level: default_log_level(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// JSON structured logging
    #[default]
    Json,
    /// Human-readable multi-line format
    Pretty,
    /// Compact single-line format
    Compact,
}
