//! # Delivery
//!
//! Log entry delivery layers.
//!
//! Responsibilities:
//! - Append entries to a rotating file (`FileSink`)
//! - Decouple producers from slow sinks with a bounded queue (`BatchSink`)
//! - Repeat transient failures with backoff (`RetrySink`)
//! - Assemble the configured stack (`build_sink`)

pub mod batch;
pub mod builder;
pub mod metrics;
pub mod retry;
pub mod sinks;

pub use batch::{BatchOptions, BatchSink};
pub use builder::{build_sink, stack_names, ConfiguredSink};
pub use contracts::{Context, ContractError, LocalSink, Sink};
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use retry::RetrySink;
pub use sinks::{FileSink, FileSinkConfig};
