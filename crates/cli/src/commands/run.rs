//! `run` command implementation.

use anyhow::{Context as _, Result};
use std::time::Duration;
use tokio::io::BufReader;
use tracing::{info, warn};

use contracts::{Context, Sink};
use delivery::build_sink;

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pump::{pump_lines, PumpStats};

/// Execute the `run` command
pub async fn run_sink(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let mut config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if let Some(ref path) = args.path {
        info!(path = %path.display(), "Overriding sink path from CLI");
        config.sink.path = path.clone();
    }

    info!(
        path = %config.sink.path.display(),
        batched = config.sink.batch.is_some(),
        retry = config.sink.enabled_retry().is_some(),
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        for name in delivery::stack_names(&config.sink) {
            println!("{name}");
        }
        return Ok(());
    }

    let metrics_port = args
        .metrics_port
        .or(config.observability.metrics_port)
        .filter(|port| *port != 0);
    if let Some(port) = metrics_port {
        observability::init_metrics_only(port)?;
    }

    let sink = build_sink(&config.sink).map_err(CliError::SinkBuild)?;
    let root = Context::background();
    let mut stats = PumpStats::default();

    info!(sink = %sink.name(), "Reading entries from stdin");
    let pumped = tokio::select! {
        result = pump_lines(BufReader::new(tokio::io::stdin()), &sink, &root, &mut stats) => result,
        _ = shutdown_signal() => {
            warn!("Received shutdown signal, closing sink...");
            Ok(())
        }
    };

    let timeout = Duration::from_secs(args.shutdown_timeout);
    let close_ctx = root.with_timeout(timeout);
    let closed = sink.close(&close_ctx).await.map_err(|e| {
        if e.is_cancellation() {
            CliError::shutdown_timed_out(timeout, &e)
        } else {
            CliError::shutdown(e.to_string())
        }
    });

    stats.print_summary(sink.name());
    if let Some(metrics) = sink.metrics() {
        info!(
            accepted = metrics.accepted_count,
            dropped = metrics.dropped_count,
            delivered = metrics.delivered_count,
            failures = metrics.failure_count,
            batches = metrics.batch_count,
            "Queue metrics"
        );
    }

    pumped?;
    closed?;
    info!(lines = stats.lines_read, "Logsink finished");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
///
/// A handler that cannot be installed is logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
