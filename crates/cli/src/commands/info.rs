//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use contracts::{LogsinkConfig, RetryPolicy};

use crate::cli::InfoArgs;
use crate::error::CliError;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    /// Layer names, outermost first
    stack: Vec<String>,
    file: FileInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    batch: Option<BatchInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry: Option<RetryPolicy>,
}

#[derive(Serialize)]
struct FileInfo {
    path: String,
    file_mode: String,
    /// Bytes; absent when size rotation is disabled
    #[serde(skip_serializing_if = "Option::is_none")]
    max_size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_age_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_backups: Option<usize>,
    compress: bool,
}

#[derive(Serialize)]
struct BatchInfo {
    queue_capacity: usize,
    max_entries: usize,
    interval_ms: u64,
    backpressure: String,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let info = build_config_info(&config);
    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn build_config_info(config: &LogsinkConfig) -> ConfigInfo {
    let sink = &config.sink;
    let rotation = sink.rotation.normalized();

    ConfigInfo {
        version: format!("{:?}", config.version),
        stack: delivery::stack_names(sink),
        file: FileInfo {
            path: sink.path.display().to_string(),
            file_mode: format!("{:#o}", sink.effective_file_mode()),
            max_size_bytes: rotation.size_limit(),
            max_age_secs: rotation.age_limit().map(|age| age.as_secs()),
            max_backups: rotation.backup_limit(),
            compress: rotation.compress,
        },
        batch: sink.batch.as_ref().map(|batch| BatchInfo {
            queue_capacity: batch.effective_queue_capacity(),
            max_entries: batch.policy().max_entries,
            interval_ms: batch.interval_ms,
            backpressure: batch.backpressure.to_string(),
        }),
        retry: sink.enabled_retry(),
    }
}

fn print_config_info(info: &ConfigInfo) {
    println!("=== Logsink Configuration ===\n");
    println!("Version: {}", info.version);

    println!("\nStack (outermost first):");
    for name in &info.stack {
        println!("  - {}", name);
    }

    let file = &info.file;
    println!("\nFile:");
    println!("  Path: {}", file.path);
    println!("  Mode: {}", file.file_mode);
    println!("  Max size: {}", describe(file.max_size_bytes.map(|b| format!("{b} bytes"))));
    println!("  Max age: {}", describe(file.max_age_secs.map(|s| format!("{s}s"))));
    println!("  Max backups: {}", describe(file.max_backups.map(|n| n.to_string())));
    println!("  Compress: {}", file.compress);

    if let Some(ref batch) = info.batch {
        println!("\nBatch:");
        println!("  Queue capacity: {}", batch.queue_capacity);
        println!("  Max entries: {}", describe((batch.max_entries > 0).then(|| batch.max_entries.to_string())));
        println!("  Interval: {}", describe((batch.interval_ms > 0).then(|| format!("{}ms", batch.interval_ms))));
        println!("  Backpressure: {}", batch.backpressure);
    }

    if let Some(ref retry) = info.retry {
        println!("\nRetry:");
        println!("  Max retries: {}", retry.max_retries);
        println!(
            "  Backoff: {}ms x{} (max {}ms)",
            retry.initial_ms, retry.multiplier, retry.max_ms
        );
    }

    println!();
}

fn describe(value: Option<String>) -> String {
    value.unwrap_or_else(|| "disabled".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use config_loader::{ConfigFormat, ConfigLoader};

    #[test]
    fn test_build_config_info() {
        let config = ConfigLoader::load_from_str(
            r#"
[sink]
path = "/var/log/app.log"

[sink.rotation]
max_size_bytes = 1024
max_backups = -3

[sink.batch]
backpressure = "drop"

[sink.retry]
enable = true
"#,
            ConfigFormat::Toml,
        )
        .unwrap();

        let info = build_config_info(&config);
        assert_eq!(
            info.stack,
            vec!["batch(retry(file(app.log)))", "retry(file(app.log))", "file(app.log)"]
        );
        assert_eq!(info.file.file_mode, "0o640");
        assert_eq!(info.file.max_size_bytes, Some(1024));
        assert_eq!(info.file.max_backups, None);
        let batch = info.batch.unwrap();
        assert_eq!(batch.queue_capacity, 1024);
        assert_eq!(batch.backpressure, "drop");
        assert!(info.retry.is_some());
    }
}
