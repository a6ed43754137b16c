//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Validate configuration legality
//! - Produce a `LogsinkConfig`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let config = ConfigLoader::load_from_path(Path::new("logsink.toml")).unwrap();
//! println!("Path: {}", config.sink.path.display());
//! ```

mod parser;
mod validator;

pub use contracts::LogsinkConfig;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<LogsinkConfig, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<LogsinkConfig, ContractError> {
        Self::parse_and_validate(content, format)
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }

    /// Parse and validate configuration content
    fn parse_and_validate(
        content: &str,
        format: ConfigFormat,
    ) -> Result<LogsinkConfig, ContractError> {
        let config = parser::parse(content, format)?;
        validator::validate(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL_TOML: &str = r#"
[sink]
path = "/var/log/app.log"

[sink.rotation]
max_size_bytes = 1048576
max_backups = 3

[sink.batch]
max_entries = 64
interval_ms = 200
backpressure = "shed"
"#;

    #[test]
    fn test_load_from_str_toml() {
        let result = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.sink.path, Path::new("/var/log/app.log"));
        assert_eq!(config.sink.rotation.max_size_bytes, 1_048_576);
    }

    #[test]
    fn test_negative_batch_sizes_fall_back_to_defaults() {
        let content = r#"
[sink]
path = "/var/log/app.log"

[sink.batch]
queue_capacity = -1
max_entries = -3
"#;
        let config = ConfigLoader::load_from_str(content, ConfigFormat::Toml).unwrap();
        let batch = config.sink.batch.unwrap();
        assert_eq!(batch.effective_queue_capacity(), contracts::DEFAULT_QUEUE_CAPACITY);
        assert_eq!(batch.policy().count_trigger(), None);
    }

    #[test]
    fn test_load_from_str_json() {
        let content = r#"{ "sink": { "path": "/var/log/app.log", "batch": { "queue_capacity": 0 } } }"#;
        let config = ConfigLoader::load_from_str(content, ConfigFormat::Json).unwrap();
        assert_eq!(config.sink.path, Path::new("/var/log/app.log"));
        assert_eq!(
            config.sink.batch.unwrap().effective_queue_capacity(),
            contracts::DEFAULT_QUEUE_CAPACITY
        );
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = r#"
[sink]
path = ""
"#;
        let result = ConfigLoader::load_from_str(content, ConfigFormat::Toml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("cannot be empty"));
    }

    #[test]
    fn test_unsupported_extension() {
        let result = ConfigLoader::load_from_path(Path::new("logsink.yaml"));
        assert!(matches!(result, Err(ContractError::ConfigParse { .. })));
    }
}
