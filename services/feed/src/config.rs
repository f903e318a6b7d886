//! Feed service configuration
//!
//! Environment-driven knobs with embedded-friendly defaults. `APP_ENV=test`
//! selects in-memory repositories so test runs leave no files behind.

use std::path::PathBuf;
use std::time::Duration;

/// What to do with a resubmitted `(partner, external id)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Accept and store again; the external-id index repoints to the most
    /// recent record while the older body stays under its internal id.
    #[default]
    Accept,
    /// Reject the resubmission without consuming a sequence number.
    Reject,
}

#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Directory holding `orders.json`, `sequences.json`, `errors.json`.
    pub data_dir: PathBuf,
    /// Skip file persistence entirely.
    pub in_memory: bool,
    pub duplicate_policy: DuplicatePolicy,
    pub orders_flush: Duration,
    pub sequences_flush: Duration,
    pub errors_flush: Duration,
}

impl FeedConfig {
    pub fn from_env() -> Self {
        Self {
            data_dir: std::env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data")),
            in_memory: std::env::var("APP_ENV")
                .map(|env| env == "test")
                .unwrap_or(false),
            duplicate_policy: std::env::var("REJECT_DUPLICATE_ORDERS")
                .ok()
                .and_then(|v| v.parse::<bool>().ok())
                .map(|reject| {
                    if reject {
                        DuplicatePolicy::Reject
                    } else {
                        DuplicatePolicy::Accept
                    }
                })
                .unwrap_or_default(),
            orders_flush: flush_interval("ORDERS_FLUSH_MS", 500),
            sequences_flush: flush_interval("SEQUENCES_FLUSH_MS", 100),
            errors_flush: flush_interval("ERRORS_FLUSH_MS", 500),
        }
    }

    /// In-memory configuration for tests and embedded experiments.
    pub fn in_memory() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            in_memory: true,
            duplicate_policy: DuplicatePolicy::default(),
            orders_flush: Duration::from_millis(500),
            sequences_flush: Duration::from_millis(100),
            errors_flush: Duration::from_millis(500),
        }
    }

    /// File-backed configuration rooted at `data_dir`.
    pub fn file_backed(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            in_memory: false,
            ..Self::in_memory()
        }
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }
}

fn flush_interval(var: &str, default_ms: u64) -> Duration {
    let ms = std::env::var(var)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default_ms);
    Duration::from_millis(ms)
}
