//! RetrySink - repeats failed writes and flushes with exponential backoff
//!
//! Only errors that [`ContractError::is_retryable`] accepts are repeated.
//! Backoff sleeps end early when the caller's context ends.

use tracing::{debug, instrument, warn};

use contracts::{Context, ContractError, RetryPolicy, Sink};

/// Retry wrapper around an inner sink
pub struct RetrySink<S> {
    name: String,
    inner: S,
    policy: RetryPolicy,
}

impl<S: Sink> RetrySink<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self {
            name: format!("retry({})", inner.name()),
            inner,
            policy,
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Sleep before retry `attempt`, or return the context's error
    async fn backoff(&self, ctx: &Context, attempt: u32) -> Result<(), ContractError> {
        let delay = self.policy.backoff(attempt);
        tokio::select! {
            biased;
            err = ctx.done() => Err(err),
            _ = tokio::time::sleep(delay) => Ok(()),
        }
    }
}

macro_rules! with_retry {
    ($self:ident, $ctx:ident, $op:literal, $call:expr) => {{
        let max_retries = $self.policy.effective_retries();
        let mut attempt = 0u32;
        loop {
            match $call.await {
                Ok(()) => break Ok(()),
                Err(e) if attempt < max_retries && e.is_retryable() => {
                    attempt += 1;
                    observability::record_retry(&$self.name, $op);
                    debug!(sink = %$self.name, attempt, error = %e, "Retrying {}", $op);
                    $self.backoff($ctx, attempt).await?;
                }
                Err(e) => {
                    if attempt > 0 {
                        warn!(sink = %$self.name, attempts = attempt + 1, error = %e, "{} failed after retries", $op);
                    }
                    break Err(e);
                }
            }
        }
    }};
}

impl<S: Sink + Sync> Sink for RetrySink<S> {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "retry_sink_write", skip(self, ctx, entry), fields(sink = %self.name))]
    async fn write(&self, ctx: &Context, entry: &[u8]) -> Result<(), ContractError> {
        with_retry!(self, ctx, "write", self.inner.write(ctx, entry))
    }

    #[instrument(name = "retry_sink_flush", skip(self, ctx), fields(sink = %self.name))]
    async fn flush(&self, ctx: &Context) -> Result<(), ContractError> {
        with_retry!(self, ctx, "flush", self.inner.flush(ctx))
    }

    /// Close is attempted once; a failed close leaves nothing to retry against
    async fn close(&self, ctx: &Context) -> Result<(), ContractError> {
        self.inner.close(ctx).await
    }
}
