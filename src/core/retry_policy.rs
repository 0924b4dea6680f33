//! Policies for handler failures
//!
//! Every record carries a timestamp and a fresh insert ID, so the backend
//! treats a re-submitted record as the same entry. Retrying is therefore
//! safe, but it blocks the caller, which is why it is opt-in.

use rand::Rng;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// What to do when the handler fails to output a record
///
/// # Example
///
/// ```
/// use cloud_logging_emitter::RetryPolicy;
/// use std::time::Duration;
///
/// // Default behavior: count, alert and drop
/// let policy = RetryPolicy::default();
///
/// // Up to three attempts in total, ~10ms apart
/// let policy = RetryPolicy::Retry {
///     max_attempts: 3,
///     backoff: Duration::from_millis(10),
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RetryPolicy {
    /// Drop the record, count it and alert on stderr
    #[default]
    Drop,

    /// Re-submit the same record, sleeping between attempts
    ///
    /// `max_attempts` counts the first attempt. Once exhausted, the record
    /// is dropped as with [`RetryPolicy::Drop`].
    Retry {
        max_attempts: u32,
        backoff: Duration,
    },
}

impl RetryPolicy {
    /// Total attempts allowed, never less than one
    pub fn max_attempts(&self) -> u32 {
        match self {
            RetryPolicy::Drop => 1,
            RetryPolicy::Retry { max_attempts, .. } => (*max_attempts).max(1),
        }
    }

    /// Delay before attempt number `attempt + 1`
    ///
    /// Adds up to 50% random jitter so concurrent callers do not retry in
    /// lockstep.
    pub fn delay(&self, attempt: u32) -> Duration {
        match self {
            RetryPolicy::Drop => Duration::ZERO,
            RetryPolicy::Retry { backoff, .. } => {
                if backoff.is_zero() {
                    return Duration::ZERO;
                }
                let scaled = backoff.saturating_mul(attempt.max(1));
                let millis = u64::try_from(scaled.as_millis()).unwrap_or(u64::MAX);
                let jitter = rand::thread_rng().gen_range(0..=(millis / 2).max(1));
                scaled.saturating_add(Duration::from_millis(jitter))
            }
        }
    }
}

impl fmt::Display for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryPolicy::Drop => write!(f, "Drop"),
            RetryPolicy::Retry {
                max_attempts,
                backoff,
            } => write!(f, "Retry({} attempts, {:?})", max_attempts, backoff),
        }
    }
}

/// Callback type for failure notifications
///
/// Called when a record is dropped after a handler failure.
/// The parameter is the total count of failed records so far.
pub type FailureCallback = Arc<dyn Fn(u64) + Send + Sync>;
