//! Core emitter types and traits

pub(crate) mod caller;

pub mod attr;
pub mod config;
pub mod context;
pub mod entry;
pub mod error;
pub mod handler;
pub mod logger;
pub mod metrics;
pub mod record;
pub mod retry_policy;
pub mod severity;

pub use attr::{Attr, FieldValue};
pub use config::{
    render_error_chain, with_print_error, with_span_id, with_trace_id, ContextAccessor,
    ErrorRenderer, LoggerConfig, LoggerOption, PROJECT_ENV_VAR, SEVERITY_ENV_VAR,
};
pub use context::{span_id_from_context, trace_id_from_context, Context, TraceContext};
pub use entry::{with_attrs, with_error_report, with_skip_caller, Entry, EntryOption};
pub use error::{LoggerError, Result};
pub use handler::Handler;
pub use logger::{cloud_logging_handler, Logger, LoggerBuilder};
pub use metrics::LoggerMetrics;
pub use record::{Record, SourceLocation};
pub use retry_policy::{FailureCallback, RetryPolicy};
pub use severity::Severity;
