//! Line pump: reads newline-delimited entries and writes them to a sink.

use std::time::{Duration, Instant};

use contracts::{Context, Sink};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

use crate::error::{CliError, Result};

/// Log every n-th backpressure rejection after the first
const REJECTION_LOG_EVERY: u64 = 1000;

/// Statistics from a pump run
#[derive(Debug, Clone, Default)]
pub struct PumpStats {
    /// Lines read from the input
    pub lines_read: u64,

    /// Entries the sink accepted
    pub accepted: u64,

    /// Entries rejected by backpressure (queue full)
    pub rejected: u64,

    /// Time spent pumping
    pub duration: Duration,
}

impl PumpStats {
    /// Accepted entries per second
    pub fn rate(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.accepted as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self, sink_name: &str) {
        println!("\n=== Logsink Summary ===\n");
        println!("Sink: {sink_name}");
        println!("  Duration: {:.2}s", self.duration.as_secs_f64());
        println!("  Lines read: {}", self.lines_read);
        println!("  Accepted: {}", self.accepted);
        println!("  Rejected (queue full): {}", self.rejected);
        println!("  Rate: {:.2} entries/s", self.rate());
        println!();
    }
}

/// Write every line of `reader` to `sink` until EOF
///
/// Each entry keeps its trailing newline; a final unterminated line gets one.
/// Backpressure rejections are counted and the run continues. A cancelled
/// context ends the run quietly. Any other write error aborts it.
pub async fn pump_lines<R, S>(
    mut reader: R,
    sink: &S,
    ctx: &Context,
    stats: &mut PumpStats,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    S: Sink,
{
    let started = Instant::now();
    let mut line = Vec::with_capacity(256);

    let outcome = loop {
        line.clear();
        let read = match reader.read_until(b'\n', &mut line).await {
            Ok(read) => read,
            Err(e) => break Err(CliError::from(e)),
        };
        if read == 0 {
            debug!(lines = stats.lines_read, "Input exhausted");
            break Ok(());
        }
        if line.last() != Some(&b'\n') {
            line.push(b'\n');
        }
        stats.lines_read += 1;

        match sink.write(ctx, &line).await {
            Ok(()) => stats.accepted += 1,
            Err(e) if e.is_queue_full() => {
                stats.rejected += 1;
                if stats.rejected == 1 || stats.rejected % REJECTION_LOG_EVERY == 0 {
                    warn!(sink = %sink.name(), rejected = stats.rejected, "Queue full, entries dropped");
                }
            }
            Err(e) if e.is_cancellation() => {
                debug!(sink = %sink.name(), "Pump cancelled");
                break Ok(());
            }
            Err(e) => {
                break Err(CliError::Write {
                    sink: sink.name().to_string(),
                    lines: stats.lines_read,
                    source: e,
                })
            }
        }
    };

    stats.duration += started.elapsed();
    outcome
}
