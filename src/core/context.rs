//! Request context threaded through every emission call
//!
//! The logger never inspects a [`Context`] itself. It hands it to the
//! configured trace/span accessors and to the handler. [`TraceContext`] is
//! what the bundled accessors read.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Name of the header Google front ends use to propagate traces
pub const CLOUD_TRACE_HEADER: &str = "X-Cloud-Trace-Context";

/// Distributed tracing identifiers for the current request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceContext {
    /// Trace ID, 32 hex characters for Cloud Trace
    pub trace_id: String,

    /// Span ID of the current operation, empty when unknown
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub span_id: String,

    #[serde(default)]
    pub sampled: bool,
}

impl TraceContext {
    pub fn new(trace_id: impl Into<String>, span_id: impl Into<String>) -> Self {
        Self {
            trace_id: trace_id.into(),
            span_id: span_id.into(),
            sampled: false,
        }
    }

    pub fn sampled(mut self, sampled: bool) -> Self {
        self.sampled = sampled;
        self
    }

    /// Parse an `X-Cloud-Trace-Context` value: `TRACE_ID[/SPAN_ID][;o=OPTIONS]`
    ///
    /// Returns `None` when the trace ID is missing. An unparsable span or
    /// options part is ignored rather than rejecting the whole header.
    pub fn from_cloud_trace_header(value: &str) -> Option<Self> {
        let (ids, options) = match value.trim().split_once(';') {
            Some((ids, options)) => (ids, Some(options)),
            None => (value.trim(), None),
        };
        let (trace_id, span_id) = match ids.split_once('/') {
            Some((trace, span)) => (trace, span),
            None => (ids, ""),
        };
        if trace_id.is_empty() {
            return None;
        }

        let sampled = options
            .and_then(|o| o.trim().strip_prefix("o="))
            .map(|flag| flag == "1")
            .unwrap_or(false);

        Some(Self {
            trace_id: trace_id.to_string(),
            span_id: span_id.to_string(),
            sampled,
        })
    }
}

/// Per-request context
#[derive(Debug, Clone, Default)]
pub struct Context {
    trace: Option<TraceContext>,
    values: HashMap<String, String>,
}

impl Context {
    /// Empty context: no trace, no values
    pub fn background() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_trace(mut self, trace: TraceContext) -> Self {
        self.trace = Some(trace);
        self
    }

    #[must_use]
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Build a context from request headers, picking up the Cloud trace header
    pub fn from_headers<'a, I>(headers: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut ctx = Self::background();
        for (name, value) in headers {
            if name.eq_ignore_ascii_case(CLOUD_TRACE_HEADER) {
                ctx.trace = TraceContext::from_cloud_trace_header(value);
            }
        }
        ctx
    }

    pub fn trace(&self) -> Option<&TraceContext> {
        self.trace.as_ref()
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

/// Trace accessor reading [`Context::trace`]
pub fn trace_id_from_context(ctx: &Context) -> String {
    ctx.trace()
        .map(|t| t.trace_id.clone())
        .unwrap_or_default()
}

/// Span accessor reading [`Context::trace`]
pub fn span_id_from_context(ctx: &Context) -> String {
    ctx.trace().map(|t| t.span_id.clone()).unwrap_or_default()
}
