//! Logger configuration
//!
//! [`LoggerConfig`] holds the three behaviours a deployment may swap out:
//! how errors are rendered, and how trace and span IDs are read from a
//! [`Context`]. An empty string from either accessor means "no
//! correlation" and suppresses the corresponding field.

use super::context::Context;
use super::error::{LoggerError, Result};
use super::severity::Severity;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Environment variable holding the Google Cloud project ID
pub const PROJECT_ENV_VAR: &str = "GOOGLE_CLOUD_PROJECT";

/// Optional environment variable overriding the default logger's threshold
pub const SEVERITY_ENV_VAR: &str = "LOG_SEVERITY";

/// Renders an error into the message of an error-level entry
pub type ErrorRenderer = Arc<dyn Fn(&dyn Error) -> String + Send + Sync>;

/// Reads a correlation ID from the request context
pub type ContextAccessor = Arc<dyn Fn(&Context) -> String + Send + Sync>;

/// Injected behaviours of a [`Logger`](super::Logger)
#[derive(Clone)]
pub struct LoggerConfig {
    /// Default: [`render_error_chain`]
    pub print_error: ErrorRenderer,
    /// Default: always `""`
    pub trace_id: ContextAccessor,
    /// Default: always `""`
    pub span_id: ContextAccessor,
}

impl LoggerConfig {
    /// Fold overrides into the configuration, in order
    pub fn apply<I>(&mut self, opts: I)
    where
        I: IntoIterator<Item = LoggerOption>,
    {
        for opt in opts {
            match opt {
                LoggerOption::PrintError(f) => self.print_error = f,
                LoggerOption::TraceId(f) => self.trace_id = f,
                LoggerOption::SpanId(f) => self.span_id = f,
            }
        }
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            print_error: Arc::new(render_error_chain),
            trace_id: Arc::new(|_: &Context| String::new()),
            span_id: Arc::new(|_: &Context| String::new()),
        }
    }
}

impl fmt::Debug for LoggerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerConfig").finish_non_exhaustive()
    }
}

/// Field-level override of a [`LoggerConfig`]
#[derive(Clone)]
pub enum LoggerOption {
    PrintError(ErrorRenderer),
    TraceId(ContextAccessor),
    SpanId(ContextAccessor),
}

impl fmt::Debug for LoggerOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoggerOption::PrintError(_) => f.write_str("PrintError(..)"),
            LoggerOption::TraceId(_) => f.write_str("TraceId(..)"),
            LoggerOption::SpanId(_) => f.write_str("SpanId(..)"),
        }
    }
}

/// Set the function used to render errors
pub fn with_print_error<F>(f: F) -> LoggerOption
where
    F: Fn(&dyn Error) -> String + Send + Sync + 'static,
{
    LoggerOption::PrintError(Arc::new(f))
}

/// Set the function used to read the trace ID from a context
pub fn with_trace_id<F>(f: F) -> LoggerOption
where
    F: Fn(&Context) -> String + Send + Sync + 'static,
{
    LoggerOption::TraceId(Arc::new(f))
}

/// Set the function used to read the span ID from a context
pub fn with_span_id<F>(f: F) -> LoggerOption
where
    F: Fn(&Context) -> String + Send + Sync + 'static,
{
    LoggerOption::SpanId(Arc::new(f))
}

/// Render an error followed by its `source()` chain, one cause per line
pub fn render_error_chain(err: &dyn Error) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str("\nCaused by: ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}

/// Read the project ID through `lookup`, rejecting unset or blank values
pub fn project_id_from<F>(lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(PROJECT_ENV_VAR) {
        Some(id) if !id.trim().is_empty() => Ok(id.trim().to_string()),
        _ => Err(LoggerError::missing_env(PROJECT_ENV_VAR)),
    }
}

/// Read the threshold through `lookup`, defaulting to [`Severity::Default`]
pub fn min_severity_from<F>(lookup: F) -> Result<Severity>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(SEVERITY_ENV_VAR) {
        Some(raw) if !raw.trim().is_empty() => raw
            .parse()
            .map_err(|message: String| LoggerError::config(SEVERITY_ENV_VAR, message)),
        _ => Ok(Severity::Default),
    }
}
