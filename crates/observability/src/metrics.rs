//! Sink delivery metrics
//!
//! Thin wrappers over the `metrics` facade so every crate records the same
//! names and labels. Without an installed recorder these are no-ops.

use metrics::{counter, gauge, histogram};

/// Entry accepted by a sink layer
pub fn record_entry_accepted(sink_name: &str) {
    counter!(
        "logsink_entries_accepted_total",
        "sink" => sink_name.to_string()
    )
    .increment(1);
}

/// Entry rejected by backpressure
pub fn record_entry_dropped(sink_name: &str, mode: &str) {
    counter!(
        "logsink_entries_dropped_total",
        "sink" => sink_name.to_string(),
        "mode" => mode.to_string()
    )
    .increment(1);
}

/// Background delivery to the inner sink failed (entry lost)
pub fn record_delivery_failure(sink_name: &str) {
    counter!(
        "logsink_delivery_failures_total",
        "sink" => sink_name.to_string()
    )
    .increment(1);
}

/// A pending batch was delivered to the inner sink
pub fn record_batch_flushed(sink_name: &str, entries: usize, elapsed_ms: f64) {
    counter!(
        "logsink_batches_flushed_total",
        "sink" => sink_name.to_string()
    )
    .increment(1);
    histogram!(
        "logsink_batch_size",
        "sink" => sink_name.to_string()
    )
    .record(entries as f64);
    histogram!(
        "logsink_batch_flush_ms",
        "sink" => sink_name.to_string()
    )
    .record(elapsed_ms);
}

/// Current depth of an async queue
pub fn record_queue_depth(sink_name: &str, depth: usize) {
    gauge!(
        "logsink_queue_depth",
        "sink" => sink_name.to_string()
    )
    .set(depth as f64);
}

/// Active file was rotated
pub fn record_rotation(sink_name: &str, compressed: bool) {
    counter!(
        "logsink_rotations_total",
        "sink" => sink_name.to_string(),
        "compressed" => compressed.to_string()
    )
    .increment(1);
}

/// Rotation aborted; the entry that triggered it was not written
pub fn record_rotation_failure(sink_name: &str) {
    counter!(
        "logsink_rotation_failures_total",
        "sink" => sink_name.to_string()
    )
    .increment(1);
}

/// A best-effort step (compression, pruning) failed and was swallowed
pub fn record_best_effort_failure(sink_name: &str, step: &'static str) {
    counter!(
        "logsink_best_effort_failures_total",
        "sink" => sink_name.to_string(),
        "step" => step
    )
    .increment(1);
}

/// A retry layer is about to repeat an operation
pub fn record_retry(sink_name: &str, operation: &'static str) {
    counter!(
        "logsink_retries_total",
        "sink" => sink_name.to_string(),
        "operation" => operation
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_entry_accepted("batch(file(app.log))");
        record_entry_dropped("batch(file(app.log))", "drop");
        record_delivery_failure("batch(file(app.log))");
        record_batch_flushed("batch(file(app.log))", 10, 1.5);
        record_queue_depth("batch(file(app.log))", 3);
        record_rotation("file(app.log)", true);
        record_rotation_failure("file(app.log)");
        record_best_effort_failure("file(app.log)", "compress");
        record_retry("retry(file(app.log))", "write");
    }
}
