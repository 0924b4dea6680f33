//! # Cloud Logging Emitter
//!
//! Structured log emission for Google Cloud Logging. Each call writes one
//! JSON object that the logging agent understands without further parsing:
//!
//! - `severity` and `message` under the names Cloud Logging expects
//! - `logging.googleapis.com/sourceLocation` for the application call site
//! - `logging.googleapis.com/trace` and `spanId` from the request context
//! - `logging.googleapis.com/insertId`, unique per call
//! - `@type` for error-level entries, so Error Reporting picks them up
//!
//! ```
//! use cloud_logging_emitter::prelude::*;
//!
//! let logger = Logger::new(
//!     std::io::stdout(),
//!     "my-project",
//!     Severity::Info,
//!     [with_trace_id(trace_id_from_context)],
//! )
//! .unwrap();
//!
//! let ctx = Context::background().with_trace(TraceContext::new("abc123", ""));
//! logger.info(&ctx, "request served", [with_attrs([Attr::new("status", 200)])]);
//! ```

pub mod core;
pub mod handlers;
pub mod macros;

pub mod prelude {
    pub use crate::core::{
        span_id_from_context, trace_id_from_context, with_attrs, with_error_report,
        with_print_error, with_skip_caller, with_span_id, with_trace_id, Attr, Context, Entry,
        EntryOption, FieldValue, Handler, Logger, LoggerBuilder, LoggerError, LoggerOption,
        Record, Result, RetryPolicy, Severity, TraceContext,
    };
    pub use crate::handlers::{HandlerOptions, JsonHandler};
}

pub use crate::core::{
    cloud_logging_handler, render_error_chain, span_id_from_context, trace_id_from_context,
    with_attrs, with_error_report, with_print_error, with_skip_caller, with_span_id,
    with_trace_id, Attr, Context, ContextAccessor, Entry, EntryOption, ErrorRenderer,
    FailureCallback, FieldValue, Handler, Logger, LoggerBuilder, LoggerConfig, LoggerError,
    LoggerMetrics, LoggerOption, Record, Result, RetryPolicy, Severity, SourceLocation,
    TraceContext, PROJECT_ENV_VAR, SEVERITY_ENV_VAR,
};
pub use crate::handlers::{HandlerOptions, JsonHandler};
