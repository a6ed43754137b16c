//! BatchSink - bounded queue plus one background worker in front of a sink
//!
//! `write` returns once an entry is accepted into the queue. The worker
//! delivers entries to the inner sink in acceptance order, in batches cut by
//! entry count and/or a periodic timer. Delivery errors inside the worker are
//! logged and counted but never reach the producer; wrap the inner sink in a
//! retry layer when stronger guarantees are needed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::time::{self, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use contracts::{
    Backpressure, BatchConfig, BatchPolicy, Context, ContractError, Sink, DEFAULT_QUEUE_CAPACITY,
};

use crate::metrics::{MetricsSnapshot, SinkMetrics};

/// Configuration for BatchSink
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Queue capacity (0 = default)
    pub queue_capacity: usize,
    pub policy: BatchPolicy,
    pub backpressure: Backpressure,
    /// Name override (default `batch(<inner>)`)
    pub name: Option<String>,
}

impl BatchOptions {
    pub fn effective_queue_capacity(&self) -> usize {
        if self.queue_capacity == 0 {
            DEFAULT_QUEUE_CAPACITY
        } else {
            self.queue_capacity
        }
    }
}

impl From<&BatchConfig> for BatchOptions {
    fn from(config: &BatchConfig) -> Self {
        Self {
            queue_capacity: config.effective_queue_capacity(),
            policy: config.policy(),
            backpressure: config.backpressure,
            name: config.name.clone(),
        }
    }
}

/// Asynchronous batching wrapper around an inner sink
pub struct BatchSink<S> {
    name: String,
    inner: Arc<S>,
    backpressure: Backpressure,
    /// Producer side of the queue
    tx: mpsc::Sender<Bytes>,
    /// Tells the worker to drain and exit
    stop: CancellationToken,
    /// Cancelled by the worker on exit
    done: CancellationToken,
    closed: AtomicBool,
    metrics: Arc<SinkMetrics>,
}

impl<S> BatchSink<S>
where
    S: Sink + Sync + 'static,
{
    /// Wrap `inner` and spawn the delivery worker
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(inner: S, options: BatchOptions) -> Self {
        Self::from_arc(Arc::new(inner), options)
    }

    /// Wrap a shared inner sink
    pub fn from_arc(inner: Arc<S>, options: BatchOptions) -> Self {
        let name = match options.name.as_deref().filter(|n| !n.is_empty()) {
            Some(name) => name.to_string(),
            None => format!("batch({})", inner.name()),
        };
        let capacity = options.effective_queue_capacity();
        let (tx, rx) = mpsc::channel(capacity);
        let stop = CancellationToken::new();
        let done = CancellationToken::new();
        let metrics = Arc::new(SinkMetrics::new());

        let worker = BatchWorker {
            name: name.clone(),
            inner: Arc::clone(&inner),
            policy: options.policy,
            pending: Vec::new(),
            metrics: Arc::clone(&metrics),
        };
        let worker_stop = stop.clone();
        let done_guard = done.clone().drop_guard();
        tokio::spawn(async move {
            let _done = done_guard;
            worker.run(rx, worker_stop).await;
        });

        debug!(
            sink = %name,
            capacity,
            backpressure = %options.backpressure,
            max_entries = options.policy.max_entries,
            interval_ms = options.policy.interval_ms,
            "BatchSink started"
        );

        Self {
            name,
            inner,
            backpressure: options.backpressure,
            tx,
            stop,
            done,
            closed: AtomicBool::new(false),
            metrics,
        }
    }
}

impl<S> BatchSink<S> {
    pub fn backpressure(&self) -> Backpressure {
        self.backpressure
    }

    /// Get current metrics
    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// The wrapped sink
    pub fn inner(&self) -> &Arc<S> {
        &self.inner
    }

    fn queue_depth(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    fn accepted(&self) {
        self.metrics.inc_accepted_count();
        let depth = self.queue_depth();
        self.metrics.set_queue_len(depth);
        observability::record_entry_accepted(&self.name);
        observability::record_queue_depth(&self.name, depth);
    }

    fn rejected(&self) -> ContractError {
        self.metrics.inc_dropped_count();
        observability::record_entry_dropped(&self.name, self.backpressure.as_str());
        debug!(sink = %self.name, mode = %self.backpressure, "Queue full, entry rejected");
        ContractError::QueueFull
    }
}

impl<S> Sink for BatchSink<S>
where
    S: Sink + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "batch_sink_write",
        skip(self, ctx, entry),
        fields(sink = %self.name, bytes = entry.len())
    )]
    async fn write(&self, ctx: &Context, entry: &[u8]) -> Result<(), ContractError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ContractError::Closed);
        }

        let entry = Bytes::copy_from_slice(entry);
        match self.tx.try_send(entry) {
            Ok(()) => {
                self.accepted();
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(entry)) => match self.backpressure {
                // Shed has no distinct behavior yet
                Backpressure::Drop | Backpressure::Shed => Err(self.rejected()),
                Backpressure::Block => {
                    tokio::select! {
                        biased;
                        err = ctx.done() => Err(err),
                        sent = self.tx.send(entry) => {
                            sent.map_err(|_| ContractError::Closed)?;
                            self.accepted();
                            Ok(())
                        }
                    }
                }
            },
            Err(mpsc::error::TrySendError::Closed(_)) => Err(ContractError::Closed),
        }
    }

    /// Flush the inner sink; entries still queued are not waited for
    #[instrument(name = "batch_sink_flush", skip(self, ctx), fields(sink = %self.name))]
    async fn flush(&self, ctx: &Context) -> Result<(), ContractError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ContractError::Closed);
        }
        self.inner.flush(ctx).await
    }

    /// Stop accepting entries, wait for the queue to drain, close the inner sink
    ///
    /// If `ctx` ends before the drain completes, its error is returned and the
    /// worker keeps draining in the background; the inner sink is not closed.
    #[instrument(name = "batch_sink_close", skip(self, ctx), fields(sink = %self.name))]
    async fn close(&self, ctx: &Context) -> Result<(), ContractError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        self.stop.cancel();
        tokio::select! {
            biased;
            _ = self.done.cancelled() => {}
            err = ctx.done() => {
                warn!(sink = %self.name, error = %err, "Close interrupted before queue drained");
                return Err(err);
            }
        }

        debug!(sink = %self.name, "Queue drained, closing inner sink");
        self.inner.close(ctx).await
    }
}

/// Sole consumer of the queue
struct BatchWorker<S> {
    name: String,
    inner: Arc<S>,
    policy: BatchPolicy,
    pending: Vec<Bytes>,
    metrics: Arc<SinkMetrics>,
}

impl<S> BatchWorker<S>
where
    S: Sink + Sync,
{
    #[instrument(name = "batch_worker_loop", skip_all, fields(sink = %self.name))]
    async fn run(mut self, mut rx: mpsc::Receiver<Bytes>, stop: CancellationToken) {
        debug!(sink = %self.name, "Batch worker started");

        let mut ticker = self.policy.interval().map(|period| {
            let mut ticker = time::interval_at(time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });

        loop {
            tokio::select! {
                biased;
                _ = stop.cancelled() => break,
                received = rx.recv() => match received {
                    Some(entry) => self.push(entry, rx.len()).await,
                    // Every sender dropped: the wrapper is gone
                    None => break,
                },
                _ = next_tick(&mut ticker) => self.flush().await,
            }
        }

        // Refuse new sends, then deliver everything already accepted
        rx.close();
        while let Some(entry) = rx.recv().await {
            self.push(entry, rx.len()).await;
        }
        self.flush().await;

        debug!(sink = %self.name, "Batch worker stopped");
    }

    async fn push(&mut self, entry: Bytes, queued: usize) {
        self.metrics.set_queue_len(queued);
        self.pending.push(entry);
        if let Some(max_entries) = self.policy.count_trigger() {
            if self.pending.len() >= max_entries {
                self.flush().await;
            }
        }
    }

    /// Deliver the pending batch in order, then flush the inner sink
    async fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }

        let started = Instant::now();
        let batch = std::mem::take(&mut self.pending);
        let ctx = Context::background();

        for entry in &batch {
            match self.inner.write(&ctx, entry).await {
                Ok(()) => self.metrics.inc_delivered_count(),
                Err(e) => {
                    self.metrics.inc_failure_count();
                    observability::record_delivery_failure(&self.name);
                    warn!(
                        sink = %self.name,
                        inner = %self.inner.name(),
                        error = %e,
                        "Delivery failed, entry dropped"
                    );
                }
            }
        }

        if let Err(e) = self.inner.flush(&ctx).await {
            warn!(sink = %self.name, error = %e, "Inner flush failed");
        }

        self.metrics.inc_batch_count();
        observability::record_batch_flushed(
            &self.name,
            batch.len(),
            started.elapsed().as_secs_f64() * 1000.0,
        );
    }
}

/// Next tick of an optional ticker; pends forever without one
async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
