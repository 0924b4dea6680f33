//! Logging macros for ergonomic log message formatting.
//!
//! These macros format their message like `format!` and emit it without
//! modifiers. The call site recorded is the macro invocation.
//!
//! # Examples
//!
//! ```
//! use cloud_logging_emitter::prelude::*;
//! use cloud_logging_emitter::info;
//!
//! let logger = Logger::new(std::io::sink(), "my-project", Severity::Default, []).unwrap();
//! let ctx = Context::background();
//!
//! info!(logger, &ctx, "Server started");
//!
//! let port = 8080;
//! info!(logger, &ctx, "Server listening on port {}", port);
//! ```

/// Log a formatted message at the given severity.
///
/// # Examples
///
/// ```
/// # use cloud_logging_emitter::prelude::*;
/// # let logger = Logger::new(std::io::sink(), "my-project", Severity::Default, []).unwrap();
/// # let ctx = Context::background();
/// use cloud_logging_emitter::log;
/// log!(logger, &ctx, Severity::Notice, "Simple message");
/// log!(logger, &ctx, Severity::Warning, "Retry {} of {}", 2, 5);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $ctx:expr, $severity:expr, $($arg:tt)+) => {
        $logger.custom(
            $ctx,
            $crate::Entry::new($severity, format!($($arg)+), ::std::iter::empty()),
        )
    };
}

/// Log a DEFAULT-severity message.
#[macro_export]
macro_rules! default_log {
    ($logger:expr, $ctx:expr, $($arg:tt)+) => {
        $logger.default($ctx, format!($($arg)+), ::std::iter::empty())
    };
}

/// Log a DEBUG-severity message.
///
/// # Examples
///
/// ```
/// # use cloud_logging_emitter::prelude::*;
/// # let logger = Logger::new(std::io::sink(), "my-project", Severity::Default, []).unwrap();
/// # let ctx = Context::background();
/// use cloud_logging_emitter::debug;
/// debug!(logger, &ctx, "Cache size: {}", 10);
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $ctx:expr, $($arg:tt)+) => {
        $logger.debug($ctx, format!($($arg)+), ::std::iter::empty())
    };
}

/// Log an INFO-severity message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $ctx:expr, $($arg:tt)+) => {
        $logger.info($ctx, format!($($arg)+), ::std::iter::empty())
    };
}

/// Log a NOTICE-severity message.
#[macro_export]
macro_rules! notice {
    ($logger:expr, $ctx:expr, $($arg:tt)+) => {
        $logger.notice($ctx, format!($($arg)+), ::std::iter::empty())
    };
}

/// Log a WARNING-severity message.
///
/// # Examples
///
/// ```
/// # use cloud_logging_emitter::prelude::*;
/// # let logger = Logger::new(std::io::sink(), "my-project", Severity::Default, []).unwrap();
/// # let ctx = Context::background();
/// use cloud_logging_emitter::warn;
/// warn!(logger, &ctx, "Low disk space: {}%", 3);
/// ```
#[macro_export]
macro_rules! warn {
    ($logger:expr, $ctx:expr, $($arg:tt)+) => {
        $logger.warn($ctx, format!($($arg)+), ::std::iter::empty())
    };
}
