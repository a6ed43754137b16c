//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use contracts::LogsinkConfig;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    sink: String,
    path: String,
    batched: bool,
    retry: bool,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            let stack = delivery::stack_names(&config.sink);

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", config.version),
                    sink: stack.into_iter().next().unwrap_or_default(),
                    path: config.sink.path.display().to_string(),
                    batched: config.sink.batch.is_some(),
                    retry: config.sink.enabled_retry().is_some(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &LogsinkConfig) -> Vec<String> {
    let mut warnings = Vec::new();
    let sink = &config.sink;
    let raw = sink.rotation;

    if raw.max_size_bytes < 0 || raw.max_age_secs < 0 || raw.max_backups < 0 {
        warnings.push("Negative rotation thresholds are treated as disabled".to_string());
    }

    let rotation = raw.normalized();
    if rotation.size_limit().is_none() && rotation.age_limit().is_none() {
        warnings.push("No size or age limit - the active file is never rotated".to_string());
    } else if rotation.backup_limit().is_none() {
        warnings.push("sink.rotation.max_backups is unset - backups are kept forever".to_string());
    }

    if let Some(batch) = &sink.batch {
        if batch.queue_capacity < 0 || batch.max_entries < 0 {
            warnings.push("Negative batch sizes are treated as unset".to_string());
        }
        let policy = batch.policy();
        if policy.count_trigger().is_none() && policy.interval().is_none() {
            warnings.push(
                "sink.batch has no count or interval trigger - entries are delivered only on close"
                    .to_string(),
            );
        }
    }

    if matches!(sink.retry, Some(retry) if !retry.enable) {
        warnings.push("sink.retry is present but disabled".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Sink: {}", summary.sink);
            println!("  Path: {}", summary.path);
            println!("  Batched: {}", summary.batched);
            println!("  Retry: {}", summary.retry);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
