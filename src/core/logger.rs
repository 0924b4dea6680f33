//! Main logger implementation
//!
//! Every emission goes through [`Logger::write`], which stamps the record
//! with its time, insert ID, call site and correlation fields before
//! handing it to the handler.

use super::{
    attr::Attr,
    caller,
    config::{self, LoggerConfig, LoggerOption},
    context::Context,
    entry::{Entry, EntryOption},
    error::{LoggerError, Result},
    handler::Handler,
    metrics::LoggerMetrics,
    record::Record,
    retry_policy::{FailureCallback, RetryPolicy},
    severity::Severity,
};
use crate::handlers::json::{self, HandlerOptions, JsonHandler};
use chrono::Utc;
use std::error::Error;
use std::fmt;
use std::io::Write;
use std::panic::Location;
use std::sync::{Arc, OnceLock};
use std::thread;
use uuid::Uuid;

pub const MESSAGE_KEY: &str = "message";
pub const SEVERITY_KEY: &str = "severity";
pub const SOURCE_LOCATION_KEY: &str = "logging.googleapis.com/sourceLocation";
pub const TRACE_KEY: &str = "logging.googleapis.com/trace";
pub const SPAN_ID_KEY: &str = "logging.googleapis.com/spanId";
pub const INSERT_ID_KEY: &str = "logging.googleapis.com/insertId";

/// Marks an entry for Error Reporting
pub const TYPE_KEY: &str = "@type";
pub const REPORTED_ERROR_EVENT_TYPE: &str =
    "type.googleapis.com/google.devtools.clouderrorreporting.v1beta1.ReportedErrorEvent";

static DEFAULT_LOGGER: OnceLock<Logger> = OnceLock::new();

pub struct Logger {
    handler: Box<dyn Handler>,
    project_id: String,
    config: LoggerConfig,
    retry_policy: RetryPolicy,
    on_failure: Option<FailureCallback>,
    metrics: LoggerMetrics,
}

impl Logger {
    /// Logger writing Cloud Logging JSON lines to `writer`
    ///
    /// Records below `min_severity` are dropped. `opts` override the
    /// defaults of [`LoggerConfig`], later options winning.
    pub fn new<W, I>(
        writer: W,
        project_id: impl Into<String>,
        min_severity: Severity,
        opts: I,
    ) -> Result<Self>
    where
        W: Write + Send + 'static,
        I: IntoIterator<Item = LoggerOption>,
    {
        Self::builder()
            .writer(writer)
            .project_id(project_id)
            .min_severity(min_severity)
            .options(opts)
            .build()
    }

    /// Process-wide logger writing to stderr
    ///
    /// Built on first use from `GOOGLE_CLOUD_PROJECT` (and `LOG_SEVERITY`,
    /// default `DEFAULT`); every later call returns the same instance.
    /// An unrecognised `LOG_SEVERITY` is reported on stderr and treated
    /// as `DEFAULT`.
    ///
    /// # Panics
    ///
    /// Panics if `GOOGLE_CLOUD_PROJECT` is unset or empty.
    pub fn must_default() -> &'static Logger {
        DEFAULT_LOGGER.get_or_init(|| Self::default_from(|name| std::env::var(name).ok()))
    }

    fn default_from<F>(lookup: F) -> Logger
    where
        F: Fn(&str) -> Option<String>,
    {
        let project_id = config::project_id_from(&lookup).unwrap_or_else(|e| panic!("{}", e));
        let min_severity = config::min_severity_from(&lookup).unwrap_or_else(|e| {
            eprintln!("[LOGGER WARN] {}, logging at {}", e, Severity::Default);
            Severity::Default
        });
        Self::builder()
            .writer(std::io::stderr())
            .project_id(project_id)
            .min_severity(min_severity)
            .build()
            .unwrap_or_else(|e| panic!("{}", e))
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }

    pub fn flush(&self) -> Result<()> {
        self.handler.flush()
    }

    /// Resource name of a trace in this logger's project
    pub fn trace_resource(&self, trace_id: &str) -> String {
        format!("projects/{}/traces/{}", self.project_id, trace_id)
    }

    /// The only path to the handler.
    ///
    /// Must stay `#[track_caller]` and be called directly from the public
    /// emission methods, which are `#[track_caller]` too: the tracked
    /// location is then the application's call site.
    #[track_caller]
    fn write(&self, ctx: &Context, entry: Entry) {
        if !self.handler.enabled(ctx, entry.severity()) {
            self.metrics.record_filtered();
            return;
        }

        // Time plus a random insert ID make the entry unique downstream,
        // so re-submitting it cannot collide with another entry.
        let now = Utc::now();
        let insert_id = Uuid::new_v4().to_string();

        let source = caller::resolve(Location::caller(), entry.skip_caller());
        let error_report = entry.error_report();
        let (severity, message, extra) = entry.into_parts();
        let mut record = Record::new(now, severity, message, Some(source));

        let mut attrs = Vec::with_capacity(4 + extra.len());
        attrs.push(Attr::string(INSERT_ID_KEY, insert_id));
        if error_report {
            attrs.push(Attr::string(TYPE_KEY, REPORTED_ERROR_EVENT_TYPE));
        }
        let trace_id = (self.config.trace_id)(ctx);
        if !trace_id.is_empty() {
            attrs.push(Attr::string(TRACE_KEY, self.trace_resource(&trace_id)));
            let span_id = (self.config.span_id)(ctx);
            if !span_id.is_empty() {
                attrs.push(Attr::string(SPAN_ID_KEY, span_id));
            }
        }
        attrs.extend(extra);
        record.add_attrs(attrs);

        self.dispatch(ctx, &record);
    }

    fn dispatch(&self, ctx: &Context, record: &Record) {
        let max_attempts = self.retry_policy.max_attempts();
        let mut attempt = 1;
        loop {
            match self.handler.handle(ctx, record) {
                Ok(()) => {
                    self.metrics.record_emitted();
                    return;
                }
                Err(_) if attempt < max_attempts => {
                    self.metrics.record_retry();
                    thread::sleep(self.retry_policy.delay(attempt));
                    attempt += 1;
                }
                Err(e) => {
                    self.report_failure(&e);
                    return;
                }
            }
        }
    }

    /// Count a lost record and alert on the first one and every 1000th after
    fn report_failure(&self, err: &LoggerError) {
        let failed = self.metrics.record_failed() + 1;
        if failed == 1 || failed % 1000 == 0 {
            eprintln!(
                "[LOGGER ERROR] Handler '{}' failed, {} records dropped so far: {}",
                self.handler.name(),
                failed,
                err
            );
            if let Some(ref callback) = self.on_failure {
                callback(failed);
            }
        }
    }

    fn error_entry<I>(&self, severity: Severity, err: &dyn Error, opts: I) -> Entry
    where
        I: IntoIterator<Item = EntryOption>,
    {
        Entry::new(severity, (self.config.print_error)(err), opts).report_error()
    }

    #[track_caller]
    pub fn default<I>(&self, ctx: &Context, msg: impl Into<String>, opts: I)
    where
        I: IntoIterator<Item = EntryOption>,
    {
        self.write(ctx, Entry::new(Severity::Default, msg, opts));
    }

    #[track_caller]
    pub fn debug<I>(&self, ctx: &Context, msg: impl Into<String>, opts: I)
    where
        I: IntoIterator<Item = EntryOption>,
    {
        self.write(ctx, Entry::new(Severity::Debug, msg, opts));
    }

    #[track_caller]
    pub fn info<I>(&self, ctx: &Context, msg: impl Into<String>, opts: I)
    where
        I: IntoIterator<Item = EntryOption>,
    {
        self.write(ctx, Entry::new(Severity::Info, msg, opts));
    }

    #[track_caller]
    pub fn notice<I>(&self, ctx: &Context, msg: impl Into<String>, opts: I)
    where
        I: IntoIterator<Item = EntryOption>,
    {
        self.write(ctx, Entry::new(Severity::Notice, msg, opts));
    }

    #[track_caller]
    pub fn warn<I>(&self, ctx: &Context, msg: impl Into<String>, opts: I)
    where
        I: IntoIterator<Item = EntryOption>,
    {
        self.write(ctx, Entry::new(Severity::Warning, msg, opts));
    }

    /// Log `err` at ERROR and report it to Error Reporting
    #[track_caller]
    pub fn error<I>(&self, ctx: &Context, err: &dyn Error, opts: I)
    where
        I: IntoIterator<Item = EntryOption>,
    {
        self.write(ctx, self.error_entry(Severity::Error, err, opts));
    }

    #[track_caller]
    pub fn critical<I>(&self, ctx: &Context, err: &dyn Error, opts: I)
    where
        I: IntoIterator<Item = EntryOption>,
    {
        self.write(ctx, self.error_entry(Severity::Critical, err, opts));
    }

    #[track_caller]
    pub fn alert<I>(&self, ctx: &Context, err: &dyn Error, opts: I)
    where
        I: IntoIterator<Item = EntryOption>,
    {
        self.write(ctx, self.error_entry(Severity::Alert, err, opts));
    }

    #[track_caller]
    pub fn emergency<I>(&self, ctx: &Context, err: &dyn Error, opts: I)
    where
        I: IntoIterator<Item = EntryOption>,
    {
        self.write(ctx, self.error_entry(Severity::Emergency, err, opts));
    }

    /// Write a caller-built entry as is
    ///
    /// Nothing is forced here: severity, message and the error-report flag
    /// are exactly what the entry says. The shape of this method may change
    /// between releases.
    #[track_caller]
    pub fn custom(&self, ctx: &Context, entry: Entry) {
        self.write(ctx, entry);
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("handler", &self.handler.name())
            .field("project_id", &self.project_id)
            .field("retry_policy", &self.retry_policy)
            .finish_non_exhaustive()
    }
}

/// JSON handler renaming the built-in keys to what Cloud Logging expects
pub fn cloud_logging_handler<W: Write + Send>(writer: W, min_severity: Severity) -> JsonHandler<W> {
    let replace_attr: json::ReplaceAttr = Arc::new(|mut attr: Attr| {
        let renamed = match attr.key.as_str() {
            json::LEVEL_KEY => Some(SEVERITY_KEY),
            json::SOURCE_KEY => Some(SOURCE_LOCATION_KEY),
            json::MESSAGE_KEY => Some(MESSAGE_KEY),
            _ => None,
        };
        if let Some(key) = renamed {
            attr.key = key.to_string();
        }
        attr
    });

    JsonHandler::new(
        writer,
        HandlerOptions {
            min_severity,
            add_source: true,
            replace_attr: Some(replace_attr),
        },
    )
}

enum Output {
    Writer(Box<dyn Write + Send>),
    Handler(Box<dyn Handler>),
}

/// Builder for Logger configuration
///
/// # Example
/// ```
/// use cloud_logging_emitter::prelude::*;
/// use std::time::Duration;
///
/// let logger = Logger::builder()
///     .project_id("my-project")
///     .min_severity(Severity::Info)
///     .writer(std::io::stdout())
///     .option(with_trace_id(trace_id_from_context))
///     .option(with_span_id(span_id_from_context))
///     .retry_policy(RetryPolicy::Retry {
///         max_attempts: 3,
///         backoff: Duration::from_millis(5),
///     })
///     .build()
///     .unwrap();
/// ```
pub struct LoggerBuilder {
    project_id: String,
    min_severity: Severity,
    output: Option<Output>,
    config: LoggerConfig,
    retry_policy: RetryPolicy,
    on_failure: Option<FailureCallback>,
}

impl LoggerBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            project_id: String::new(),
            min_severity: Severity::Default,
            output: None,
            config: LoggerConfig::default(),
            retry_policy: RetryPolicy::Drop,
            on_failure: None,
        }
    }

    /// Project used in trace resource names. Required.
    #[must_use = "builder methods return a new value"]
    pub fn project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = project_id.into();
        self
    }

    /// Threshold of the JSON handler built for [`writer`](Self::writer)
    ///
    /// A handler passed to [`handler`](Self::handler) filters on its own.
    #[must_use = "builder methods return a new value"]
    pub fn min_severity(mut self, severity: Severity) -> Self {
        self.min_severity = severity;
        self
    }

    /// Write Cloud Logging JSON to `writer`. Defaults to stderr.
    #[must_use = "builder methods return a new value"]
    pub fn writer<W: Write + Send + 'static>(mut self, writer: W) -> Self {
        self.output = Some(Output::Writer(Box::new(writer)));
        self
    }

    /// Use a custom handler instead of the JSON handler
    #[must_use = "builder methods return a new value"]
    pub fn handler<H: Handler + 'static>(mut self, handler: H) -> Self {
        self.output = Some(Output::Handler(Box::new(handler)));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn option(mut self, opt: LoggerOption) -> Self {
        self.config.apply([opt]);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn options<I>(mut self, opts: I) -> Self
    where
        I: IntoIterator<Item = LoggerOption>,
    {
        self.config.apply(opts);
        self
    }

    /// Default is [`RetryPolicy::Drop`]
    #[must_use = "builder methods return a new value"]
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Called when records are dropped after handler failures
    #[must_use = "builder methods return a new value"]
    pub fn on_failure(mut self, callback: FailureCallback) -> Self {
        self.on_failure = Some(callback);
        self
    }

    /// Build the Logger
    pub fn build(self) -> Result<Logger> {
        let project_id = self.project_id.trim().to_string();
        if project_id.is_empty() {
            return Err(LoggerError::config("Logger", "project id must not be empty"));
        }

        let handler: Box<dyn Handler> = match self.output {
            Some(Output::Handler(handler)) => handler,
            Some(Output::Writer(writer)) => {
                Box::new(cloud_logging_handler(writer, self.min_severity))
            }
            None => Box::new(cloud_logging_handler(std::io::stderr(), self.min_severity)),
        };

        Ok(Logger {
            handler,
            project_id,
            config: self.config,
            retry_policy: self.retry_policy,
            on_failure: self.on_failure,
            metrics: LoggerMetrics::new(),
        })
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger {
    /// Create a builder for Logger
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }
}
