//! Config parsing
//!
//! Supports TOML (primary) and JSON.

use contracts::{ContractError, LogsinkConfig};

/// Config file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML (recommended)
    Toml,
    /// JSON
    Json,
}

impl ConfigFormat {
    /// Infer format from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Parse TOML config
pub fn parse_toml(content: &str) -> Result<LogsinkConfig, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse JSON config
pub fn parse_json(content: &str) -> Result<LogsinkConfig, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse config in the given format
pub fn parse(content: &str, format: ConfigFormat) -> Result<LogsinkConfig, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{Backpressure, LogFormat};

    #[test]
    fn test_parse_toml_full() {
        let content = r#"
version = "V1"

[sink]
name = "app"
path = "/var/log/app.log"
file_mode = 0o600

[sink.rotation]
max_size_bytes = 10485760
max_age_secs = 86400
max_backups = 7
compress = true

[sink.batch]
queue_capacity = 256
max_entries = 100
interval_ms = 500
backpressure = "drop"

[sink.retry]
enable = true
max_retries = 5

[observability]
log_format = "compact"
metrics_port = 9100
"#;
        let result = parse_toml(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.sink.name.as_deref(), Some("app"));
        assert_eq!(config.sink.effective_file_mode(), 0o600);
        assert_eq!(config.sink.rotation.max_backups, 7);
        assert!(config.sink.rotation.compress);

        let batch = config.sink.batch.unwrap();
        assert_eq!(batch.queue_capacity, 256);
        assert_eq!(batch.backpressure, Backpressure::Drop);

        let retry = config.sink.retry.unwrap();
        assert!(retry.enable);
        assert_eq!(retry.max_retries, 5);
        assert_eq!(retry.initial_ms, 10);

        assert_eq!(config.observability.log_format, LogFormat::Compact);
        assert_eq!(config.observability.metrics_port, Some(9100));
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{ "sink": { "path": "/tmp/app.log" } }"#;
        let result = parse_json(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let config = result.unwrap();
        assert!(config.sink.batch.is_none());
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_parse_unknown_backpressure_defaults_to_block() {
        let content = r#"
[sink]
path = "/tmp/app.log"

[sink.batch]
backpressure = "teleport"
"#;
        let config = parse_toml(content).unwrap();
        assert_eq!(config.sink.batch.unwrap().backpressure, Backpressure::Block);
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let content = "invalid toml [[[";
        let result = parse_toml(content);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_extension("toml"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("TOML"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("json"),
            Some(ConfigFormat::Json)
        );
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
