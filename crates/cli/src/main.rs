//! # Logsink CLI
//!
//! Command-line entry point.
//!
//! Provides:
//! - Configuration loading and validation
//! - Piping stdin lines into the configured sink stack
//! - Graceful shutdown handling

mod cli;
mod commands;
mod error;
mod pump;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use cli::{Cli, Commands, LogFormat};
use commands::{run_info, run_sink, run_validate};
use contracts::ObservabilitySettings;
use observability::ObservabilityConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_logging(&cli)?;

    info!(version = env!("CARGO_PKG_VERSION"), "Logsink CLI starting");

    let result = match &cli.command {
        Commands::Run(args) => run_sink(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// Initialize logging from the configuration file and CLI options
///
/// A file that fails to load is reported later by the command itself.
fn init_logging(cli: &Cli) -> Result<()> {
    let settings = config_loader::ConfigLoader::load_from_path(cli.command.config_path())
        .map(|config| config.observability)
        .ok();
    observability::init_with_config(logging_config(cli, settings.as_ref()))
}

/// Resolve logging settings; explicit CLI flags win over the file
fn logging_config(cli: &Cli, settings: Option<&ObservabilitySettings>) -> ObservabilityConfig {
    let mut config = match settings {
        Some(settings) => ObservabilityConfig::from(settings),
        None => ObservabilityConfig {
            log_format: LogFormat::default().into(),
            ..Default::default()
        },
    };

    // The exporter is started by `run`
    config.metrics_port = None;

    if let Some(format) = cli.log_format {
        config.log_format = format.into();
    }
    if let Some(level) = cli_log_level(cli) {
        config.default_log_level = level.to_string();
    }
    config
}

fn cli_log_level(cli: &Cli) -> Option<&'static str> {
    if cli.quiet {
        return Some("warn");
    }
    match cli.verbose {
        0 => None,
        1 => Some("debug"),
        _ => Some("trace"),
    }
}
