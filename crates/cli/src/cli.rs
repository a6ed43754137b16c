//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

/// Logsink - rotating, batching log file delivery
#[derive(Parser, Debug)]
#[command(
    name = "logsink",
    author,
    version,
    about = "Rotating, batching log file delivery",
    long_about = "Writes log entries to a size/age rotated file, optionally behind a \n\
                  bounded async queue with backpressure and a retry layer.\n\n\
                  `run` pipes stdin lines into the configured sink stack."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    ///
    /// Overrides `observability.log_level` from the configuration file.
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "LOGSINK_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format (diagnostics go to stdout, entries to the sink)
    ///
    /// Overrides `observability.log_format`; pretty when neither is set.
    #[arg(long, value_enum, global = true, env = "LOGSINK_LOG_FORMAT")]
    pub log_format: Option<LogFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Pipe stdin lines into the configured sink stack
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display the resolved sink stack
    Info(InfoArgs),
}

impl Commands {
    /// Configuration file the command reads
    pub fn config_path(&self) -> &Path {
        match self {
            Self::Run(args) => &args.config,
            Self::Validate(args) => &args.config,
            Self::Info(args) => &args.config,
        }
    }
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "logsink.toml", env = "LOGSINK_CONFIG")]
    pub config: PathBuf,

    /// Override the active log file path from configuration
    #[arg(long, env = "LOGSINK_PATH")]
    pub path: Option<PathBuf>,

    /// Seconds to wait for the queue to drain on shutdown
    #[arg(long, default_value = "10", env = "LOGSINK_SHUTDOWN_TIMEOUT")]
    pub shutdown_timeout: u64,

    /// Metrics server port (overrides configuration, 0 = disabled)
    #[arg(long, env = "LOGSINK_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    /// Validate configuration and exit without reading stdin
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "logsink.toml", env = "LOGSINK_CONFIG")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "logsink.toml", env = "LOGSINK_CONFIG")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for contracts::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
