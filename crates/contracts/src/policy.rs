//! Delivery policies: rotation, batching, backpressure, retry
//!
//! Zero (and, for rotation, negative) values switch a dimension off rather
//! than being rejected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Default capacity of the async batch queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// File rotation policy
///
/// Signed fields mirror what a config file may contain; use
/// [`RotationPolicy::normalized`] or the accessors to read them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RotationPolicy {
    /// Rotate when the active file would grow past this many bytes
    #[serde(default)]
    pub max_size_bytes: i64,

    /// Rotate when the active file is at least this old (seconds)
    #[serde(default)]
    pub max_age_secs: i64,

    /// Keep at most this many backups, oldest deleted first
    #[serde(default)]
    pub max_backups: i64,

    /// Gzip rotated backups
    #[serde(default)]
    pub compress: bool,
}

impl RotationPolicy {
    /// Clamp negative thresholds to zero (disabled)
    pub fn normalized(self) -> Self {
        Self {
            max_size_bytes: self.max_size_bytes.max(0),
            max_age_secs: self.max_age_secs.max(0),
            max_backups: self.max_backups.max(0),
            compress: self.compress,
        }
    }

    pub fn size_limit(&self) -> Option<u64> {
        u64::try_from(self.max_size_bytes).ok().filter(|&n| n > 0)
    }

    pub fn age_limit(&self) -> Option<Duration> {
        u64::try_from(self.max_age_secs)
            .ok()
            .filter(|&n| n > 0)
            .map(Duration::from_secs)
    }

    pub fn backup_limit(&self) -> Option<usize> {
        usize::try_from(self.max_backups).ok().filter(|&n| n > 0)
    }
}

/// Batch flush triggers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BatchPolicy {
    /// Flush once this many entries are pending (0 = no count trigger)
    #[serde(default)]
    pub max_entries: usize,

    /// Flush at this period in milliseconds (0 = no time trigger)
    #[serde(default)]
    pub interval_ms: u64,
}

impl BatchPolicy {
    pub fn count_trigger(&self) -> Option<usize> {
        (self.max_entries > 0).then_some(self.max_entries)
    }

    pub fn interval(&self) -> Option<Duration> {
        (self.interval_ms > 0).then(|| Duration::from_millis(self.interval_ms))
    }
}

/// Behavior when the bounded queue is full
///
/// Parsed leniently: unrecognized names fall back to `Block`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Backpressure {
    /// Wait for space or for the caller's context to end
    #[default]
    Block,
    /// Reject the entry with `QueueFull`
    Drop,
    /// Currently rejects like `Drop`; reserved for shedding queued entries
    Shed,
}

impl Backpressure {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Block => "block",
            Self::Drop => "drop",
            Self::Shed => "shed",
        }
    }
}

impl From<&str> for Backpressure {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "drop" => Self::Drop,
            "shed" => Self::Shed,
            _ => Self::Block,
        }
    }
}

impl From<String> for Backpressure {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<Backpressure> for String {
    fn from(value: Backpressure) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Backpressure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Retry/backoff policy for unreliable sinks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    #[serde(default)]
    pub enable: bool,

    /// Additional attempts after the first failure
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry (milliseconds)
    #[serde(default = "default_initial_ms")]
    pub initial_ms: u64,

    /// Upper bound on the delay (milliseconds, 0 = unbounded)
    #[serde(default = "default_max_ms")]
    pub max_ms: u64,

    /// Growth factor applied after each retry
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_ms() -> u64 {
    10
}

fn default_max_ms() -> u64 {
    1000
}

fn default_multiplier() -> f64 {
    2.0
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            enable: false,
            max_retries: default_max_retries(),
            initial_ms: default_initial_ms(),
            max_ms: default_max_ms(),
            multiplier: default_multiplier(),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.max(1.0).powi(attempt.saturating_sub(1) as i32);
        let mut delay_ms = self.initial_ms as f64 * factor;
        if self.max_ms > 0 {
            delay_ms = delay_ms.min(self.max_ms as f64);
        }
        Duration::from_millis(delay_ms as u64)
    }

    /// Number of retries actually performed after a failure
    pub fn effective_retries(&self) -> u32 {
        if self.enable {
            self.max_retries
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_negative_values_disable() {
        let policy = RotationPolicy {
            max_size_bytes: -1,
            max_age_secs: -30,
            max_backups: -2,
            compress: true,
        }
        .normalized();

        assert_eq!(policy.max_size_bytes, 0);
        assert_eq!(policy.max_age_secs, 0);
        assert_eq!(policy.max_backups, 0);
        assert!(policy.compress);
        assert_eq!(policy.size_limit(), None);
        assert_eq!(policy.age_limit(), None);
        assert_eq!(policy.backup_limit(), None);
    }

    #[test]
    fn test_rotation_limits() {
        let policy = RotationPolicy {
            max_size_bytes: 1024,
            max_age_secs: 60,
            max_backups: 3,
            compress: false,
        };
        assert_eq!(policy.size_limit(), Some(1024));
        assert_eq!(policy.age_limit(), Some(Duration::from_secs(60)));
        assert_eq!(policy.backup_limit(), Some(3));
    }

    #[test]
    fn test_batch_triggers() {
        let none = BatchPolicy::default();
        assert_eq!(none.count_trigger(), None);
        assert_eq!(none.interval(), None);

        let both = BatchPolicy {
            max_entries: 10,
            interval_ms: 250,
        };
        assert_eq!(both.count_trigger(), Some(10));
        assert_eq!(both.interval(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_backpressure_lenient_parse() {
        assert_eq!(Backpressure::from("drop"), Backpressure::Drop);
        assert_eq!(Backpressure::from("SHED"), Backpressure::Shed);
        assert_eq!(Backpressure::from("block"), Backpressure::Block);
        assert_eq!(Backpressure::from("sideways"), Backpressure::Block);
    }

    #[test]
    fn test_backpressure_serde() {
        let parsed: Backpressure = serde_json::from_str("\"drop\"").unwrap();
        assert_eq!(parsed, Backpressure::Drop);
        let unknown: Backpressure = serde_json::from_str("\"whatever\"").unwrap();
        assert_eq!(unknown, Backpressure::Block);
        assert_eq!(serde_json::to_string(&Backpressure::Shed).unwrap(), "\"shed\"");
    }

    #[test]
    fn test_retry_backoff_grows_and_caps() {
        let policy = RetryPolicy {
            enable: true,
            max_retries: 5,
            initial_ms: 10,
            max_ms: 50,
            multiplier: 2.0,
        };
        assert_eq!(policy.backoff(1), Duration::from_millis(10));
        assert_eq!(policy.backoff(2), Duration::from_millis(20));
        assert_eq!(policy.backoff(3), Duration::from_millis(40));
        assert_eq!(policy.backoff(4), Duration::from_millis(50));
    }

    #[test]
    fn test_retry_disabled_has_no_retries() {
        let policy = RetryPolicy::default();
        assert!(!policy.enable);
        assert_eq!(policy.effective_retries(), 0);
    }
}
