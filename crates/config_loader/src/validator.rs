//! Config validation
//!
//! Rules:
//! - sink.path is non-empty
//! - sink.file_mode fits in permission bits
//! - enabled retry has multiplier >= 1 and initial_ms <= max_ms
//!
//! Negative rotation thresholds are not errors; they mean "disabled".

use contracts::{ContractError, LogsinkConfig};

/// Validate a LogsinkConfig
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &LogsinkConfig) -> Result<(), ContractError> {
    validate_path(config)?;
    validate_file_mode(config)?;
    validate_retry(config)?;
    Ok(())
}

fn validate_path(config: &LogsinkConfig) -> Result<(), ContractError> {
    if config.sink.path.as_os_str().is_empty() {
        return Err(ContractError::config_validation(
            "sink.path",
            "sink path cannot be empty",
        ));
    }
    Ok(())
}

fn validate_file_mode(config: &LogsinkConfig) -> Result<(), ContractError> {
    if let Some(mode) = config.sink.file_mode {
        if mode > 0o7777 {
            return Err(ContractError::config_validation(
                "sink.file_mode",
                format!("file_mode must be <= 0o7777, got {mode:#o}"),
            ));
        }
    }
    Ok(())
}

fn validate_retry(config: &LogsinkConfig) -> Result<(), ContractError> {
    let Some(retry) = config.sink.enabled_retry() else {
        return Ok(());
    };

    if !(retry.multiplier >= 1.0) {
        return Err(ContractError::config_validation(
            "sink.retry.multiplier",
            format!("multiplier must be >= 1.0, got {}", retry.multiplier),
        ));
    }

    if retry.max_ms > 0 && retry.initial_ms > retry.max_ms {
        return Err(ContractError::config_validation(
            "sink.retry.initial_ms / sink.retry.max_ms",
            format!(
                "initial_ms ({}) must be <= max_ms ({})",
                retry.initial_ms, retry.max_ms
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{
        ConfigVersion, ObservabilitySettings, RetryPolicy, RotationPolicy, SinkConfig,
    };

    fn minimal_config() -> LogsinkConfig {
        LogsinkConfig {
            version: ConfigVersion::V1,
            sink: SinkConfig {
                path: "/var/log/app.log".into(),
                ..Default::default()
            },
            observability: ObservabilitySettings::default(),
        }
    }

    #[test]
    fn test_valid_config() {
        let config = minimal_config();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_empty_path() {
        let mut config = minimal_config();
        config.sink.path = Default::default();
        let result = validate(&config);
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("cannot be empty"), "got: {err}");
    }

    #[test]
    fn test_negative_rotation_is_accepted() {
        let mut config = minimal_config();
        config.sink.rotation = RotationPolicy {
            max_size_bytes: -5,
            max_age_secs: -1,
            max_backups: -3,
            compress: false,
        };
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_invalid_file_mode() {
        let mut config = minimal_config();
        config.sink.file_mode = Some(0o17777);
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("file_mode"), "got: {err}");
    }

    #[test]
    fn test_invalid_retry_multiplier() {
        let mut config = minimal_config();
        config.sink.retry = Some(RetryPolicy {
            enable: true,
            multiplier: 0.5,
            ..Default::default()
        });
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("multiplier"), "got: {err}");
    }

    #[test]
    fn test_invalid_retry_range() {
        let mut config = minimal_config();
        config.sink.retry = Some(RetryPolicy {
            enable: true,
            initial_ms: 500,
            max_ms: 100,
            ..Default::default()
        });
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("initial_ms"), "got: {err}");
    }

    #[test]
    fn test_disabled_retry_is_not_validated() {
        let mut config = minimal_config();
        config.sink.retry = Some(RetryPolicy {
            enable: false,
            multiplier: 0.0,
            ..Default::default()
        });
        assert!(validate(&config).is_ok());
    }
}
