//! Global atomic counters for specflow.
//!
//! Counters are incremented silently at the call site. [`Metrics::flush`]
//! emits the current values as one `tracing::info!` event.

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

pub struct Metrics {
    applies_succeeded: AtomicU64,
    applies_failed: AtomicU64,
    branch_retries: AtomicU64,
    label_failures: AtomicU64,
    degraded_categories: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! counter {
    ($inc:ident, $get:ident, $field:ident) => {
        pub fn $inc(&self) {
            self.$field.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(metric = stringify!($field), "counter incremented");
        }

        pub fn $get(&self) -> u64 {
            self.$field.load(Ordering::Relaxed)
        }
    };
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            applies_succeeded: AtomicU64::new(0),
            applies_failed: AtomicU64::new(0),
            branch_retries: AtomicU64::new(0),
            label_failures: AtomicU64::new(0),
            degraded_categories: AtomicU64::new(0),
        }
    }

    counter!(inc_applies_succeeded, applies_succeeded, applies_succeeded);
    counter!(inc_applies_failed, applies_failed, applies_failed);
    counter!(inc_branch_retries, branch_retries, branch_retries);
    counter!(inc_label_failures, label_failures, label_failures);
    counter!(inc_degraded_categories, degraded_categories, degraded_categories);

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            applies_succeeded = self.applies_succeeded(),
            applies_failed = self.applies_failed(),
            branch_retries = self.branch_retries(),
            label_failures = self.label_failures(),
            degraded_categories = self.degraded_categories(),
        );
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.applies_succeeded.store(0, Ordering::Relaxed);
        self.applies_failed.store(0, Ordering::Relaxed);
        self.branch_retries.store(0, Ordering::Relaxed);
        self.label_failures.store(0, Ordering::Relaxed);
        self.degraded_categories.store(0, Ordering::Relaxed);
    }
}
