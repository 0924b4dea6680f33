//! Handler trait for record output destinations

use super::{context::Context, error::Result, record::Record, severity::Severity};

/// Encodes and outputs records
///
/// Implementations must be safe to call from many threads at once; the
/// logger adds no locking of its own around a handler.
pub trait Handler: Send + Sync {
    /// Whether a record at `severity` would be output at all
    fn enabled(&self, ctx: &Context, severity: Severity) -> bool;

    fn handle(&self, ctx: &Context, record: &Record) -> Result<()>;

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str;
}
