//! Sink trait - the destination interface every sink layer implements
//!
//! Entries are opaque, already-encoded bytes. A sink that keeps an entry
//! past the `write` call must copy it; the caller may reuse its buffer.

use crate::{Context, ContractError};

/// Log entry destination
///
/// Implementations are shared by concurrent producers, so every method
/// takes `&self` and guards its own state.
#[trait_variant::make(Sink: Send)]
pub trait LocalSink {
    /// Stable diagnostic name (used for logging/metrics)
    ///
    /// Wrappers derive theirs from the wrapped sink, e.g. `batch(file(app.log))`.
    fn name(&self) -> &str;

    /// Submit one entry
    ///
    /// # Errors
    /// - `Closed` after `close`
    /// - the context's error if it ended first
    /// - any delivery failure of this layer
    async fn write(&self, ctx: &Context, entry: &[u8]) -> Result<(), ContractError>;

    /// Push buffered-but-undelivered data down to durable storage,
    /// to the extent the implementation supports it
    async fn flush(&self, ctx: &Context) -> Result<(), ContractError>;

    /// Release all resources
    ///
    /// Idempotent: a second call succeeds without side effects. After
    /// `close`, `write` and `flush` fail with `Closed`.
    async fn close(&self, ctx: &Context) -> Result<(), ContractError>;
}
