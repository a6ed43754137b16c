//! Builds the configured sink stack: file, optional retry, optional batching
//!
//! Layer order (innermost first): `FileSink` → `RetrySink` → `BatchSink`.
//! Retry sits inside the batch layer so that the worker's delivery attempts
//! are the ones being retried.

use tracing::{info, instrument};

use contracts::{Context, ContractError, Sink, SinkConfig};

use crate::batch::{BatchOptions, BatchSink};
use crate::metrics::MetricsSnapshot;
use crate::retry::RetrySink;
use crate::sinks::{file_sink_name, FileSink, FileSinkConfig};

/// A sink stack assembled from configuration
pub enum ConfiguredSink {
    File(FileSink),
    Retried(RetrySink<FileSink>),
    Batched(BatchSink<FileSink>),
    BatchedRetried(BatchSink<RetrySink<FileSink>>),
}

macro_rules! dispatch {
    ($self:ident, $sink:ident => $body:expr) => {
        match $self {
            ConfiguredSink::File($sink) => $body,
            ConfiguredSink::Retried($sink) => $body,
            ConfiguredSink::Batched($sink) => $body,
            ConfiguredSink::BatchedRetried($sink) => $body,
        }
    };
}

impl ConfiguredSink {
    /// Layer names, outermost first
    pub fn layers(&self) -> Vec<&'static str> {
        match self {
            Self::File(_) => vec!["file"],
            Self::Retried(_) => vec!["retry", "file"],
            Self::Batched(_) => vec!["batch", "file"],
            Self::BatchedRetried(_) => vec!["batch", "retry", "file"],
        }
    }

    /// Queue metrics when a batching layer is present
    pub fn metrics(&self) -> Option<MetricsSnapshot> {
        match self {
            Self::Batched(sink) => Some(sink.metrics_snapshot()),
            Self::BatchedRetried(sink) => Some(sink.metrics_snapshot()),
            Self::File(_) | Self::Retried(_) => None,
        }
    }
}

impl std::fmt::Debug for ConfiguredSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfiguredSink")
            .field("name", &self.name())
            .field("layers", &self.layers())
            .finish()
    }
}

impl Sink for ConfiguredSink {
    fn name(&self) -> &str {
        dispatch!(self, sink => sink.name())
    }

    async fn write(&self, ctx: &Context, entry: &[u8]) -> Result<(), ContractError> {
        dispatch!(self, sink => sink.write(ctx, entry).await)
    }

    async fn flush(&self, ctx: &Context) -> Result<(), ContractError> {
        dispatch!(self, sink => sink.flush(ctx).await)
    }

    async fn close(&self, ctx: &Context) -> Result<(), ContractError> {
        dispatch!(self, sink => sink.close(ctx).await)
    }
}

/// Names each layer of the stack `config` describes would report, outermost
/// first, without touching the filesystem
pub fn stack_names(config: &SinkConfig) -> Vec<String> {
    let mut names = vec![file_sink_name(config.name.as_deref(), &config.path)];
    if config.enabled_retry().is_some() {
        names.push(format!("retry({})", names[names.len() - 1]));
    }
    if let Some(batch) = &config.batch {
        let name = match batch.name.as_deref().filter(|n| !n.is_empty()) {
            Some(name) => name.to_string(),
            None => format!("batch({})", names[names.len() - 1]),
        };
        names.push(name);
    }
    names.reverse();
    names
}

/// Create the sink stack described by `config`
///
/// A batching layer spawns its worker, so this must run inside a Tokio
/// runtime when `config.batch` is set.
#[instrument(
    name = "delivery_build_sink",
    skip(config),
    fields(path = %config.path.display())
)]
pub fn build_sink(config: &SinkConfig) -> Result<ConfiguredSink, ContractError> {
    let file = FileSink::new(FileSinkConfig::from(config))?;

    let sink = match (config.enabled_retry(), config.batch.as_ref()) {
        (None, None) => ConfiguredSink::File(file),
        (Some(retry), None) => ConfiguredSink::Retried(RetrySink::new(file, retry)),
        (None, Some(batch)) => {
            ConfiguredSink::Batched(BatchSink::new(file, BatchOptions::from(batch)))
        }
        (Some(retry), Some(batch)) => ConfiguredSink::BatchedRetried(BatchSink::new(
            RetrySink::new(file, retry),
            BatchOptions::from(batch),
        )),
    };

    info!(sink = %sink.name(), layers = ?sink.layers(), "Sink stack built");
    Ok(sink)
}
