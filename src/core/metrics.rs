//! Logger metrics for observability
//!
//! Counts what happened to each emission call: written, filtered by the
//! threshold, or lost to a handler failure.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for logger observability
///
/// # Example
///
/// ```
/// use cloud_logging_emitter::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
///
/// metrics.record_failed();
/// metrics.record_emitted();
///
/// assert_eq!(metrics.failed_count(), 1);
/// assert_eq!(metrics.emitted_count(), 1);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Records the handler accepted
    emitted: AtomicU64,

    /// Calls rejected by the handler's enabled check
    filtered: AtomicU64,

    /// Records lost after every allowed attempt failed
    failed: AtomicU64,

    /// Extra attempts made under a retry policy
    retries: AtomicU64,
}

impl LoggerMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            emitted: AtomicU64::new(0),
            filtered: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            retries: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn emitted_count(&self) -> u64 {
        self.emitted.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn filtered_count(&self) -> u64 {
        self.filtered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn failed_count(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn retry_count(&self) -> u64 {
        self.retries.load(Ordering::Relaxed)
    }

    /// Record an emitted entry, returning the previous count
    #[inline]
    pub fn record_emitted(&self) -> u64 {
        self.emitted.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_filtered(&self) -> u64 {
        self.filtered.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_failed(&self) -> u64 {
        self.failed.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_retry(&self) -> u64 {
        self.retries.fetch_add(1, Ordering::Relaxed)
    }

    /// Failure rate as a percentage (0.0 - 100.0) of records that reached the handler
    ///
    /// Returns 0.0 if nothing reached the handler yet.
    pub fn failure_rate(&self) -> f64 {
        let failed = self.failed_count() as f64;
        let total = self.emitted_count() as f64 + failed;
        if total == 0.0 {
            0.0
        } else {
            (failed / total) * 100.0
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.emitted.store(0, Ordering::Relaxed);
        self.filtered.store(0, Ordering::Relaxed);
        self.failed.store(0, Ordering::Relaxed);
        self.retries.store(0, Ordering::Relaxed);
    }
}

impl Default for LoggerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LoggerMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            emitted: AtomicU64::new(self.emitted_count()),
            filtered: AtomicU64::new(self.filtered_count()),
            failed: AtomicU64::new(self.failed_count()),
            retries: AtomicU64::new(self.retry_count()),
        }
    }
}
