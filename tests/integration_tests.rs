//! Integration tests for the emitter
//!
//! These tests verify, on the encoded JSON:
//! - Reserved field renaming
//! - Threshold filtering
//! - Insert ID uniqueness
//! - Error Reporting marker
//! - Trace and span correlation
//! - Error rendering
//! - Thread safety
//! - Writer failures under both retry policies

mod common;

use cloud_logging_emitter::core::logger::{
    INSERT_ID_KEY, MESSAGE_KEY, REPORTED_ERROR_EVENT_TYPE, SEVERITY_KEY, SOURCE_LOCATION_KEY,
    SPAN_ID_KEY, TRACE_KEY, TYPE_KEY,
};
use cloud_logging_emitter::prelude::*;
use common::{json_logger, CountingHandler, FlakyWriter};
use std::collections::HashSet;
use std::fmt;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

#[derive(Debug)]
struct QueryError {
    table: &'static str,
    source: io::Error,
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "query on {} failed", self.table)
    }
}

impl std::error::Error for QueryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

fn query_error() -> QueryError {
    QueryError {
        table: "users",
        source: io::Error::new(io::ErrorKind::TimedOut, "connection timed out"),
    }
}

fn traced_ctx(trace_id: &str, span_id: &str) -> Context {
    Context::background().with_trace(TraceContext::new(trace_id, span_id))
}

#[test]
fn test_reserved_fields_are_renamed() {
    let (logger, buffer) = json_logger(Severity::Default, vec![]);
    logger.warn(&Context::background(), "hello", []);

    let lines = buffer.lines();
    assert_eq!(lines.len(), 1);
    let line = &lines[0];

    assert_eq!(line[MESSAGE_KEY], "hello");
    assert_eq!(line[SEVERITY_KEY], "WARNING");
    assert!(line.get("msg").is_none());
    assert!(line.get("level").is_none());
    assert!(line.get("source").is_none());

    let source = &line[SOURCE_LOCATION_KEY];
    assert!(source["file"].as_str().unwrap().ends_with("integration_tests.rs"));
    assert!(source["line"].as_u64().unwrap() > 0);
    assert!(line["time"].as_str().unwrap().ends_with('Z'));
}

#[test]
fn test_every_severity_name_on_the_wire() {
    let (logger, buffer) = json_logger(Severity::Default, vec![]);
    let ctx = Context::background();
    let err = io::Error::new(io::ErrorKind::Other, "e");

    logger.default(&ctx, "m", []);
    logger.debug(&ctx, "m", []);
    logger.info(&ctx, "m", []);
    logger.notice(&ctx, "m", []);
    logger.warn(&ctx, "m", []);
    logger.error(&ctx, &err, []);
    logger.critical(&ctx, &err, []);
    logger.alert(&ctx, &err, []);
    logger.emergency(&ctx, &err, []);

    let severities: Vec<String> = buffer
        .lines()
        .iter()
        .map(|l| l[SEVERITY_KEY].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        severities,
        [
            "DEFAULT",
            "DEBUG",
            "INFO",
            "NOTICE",
            "WARNING",
            "ERROR",
            "CRITICAL",
            "ALERT",
            "EMERGENCY"
        ]
    );
}

#[test]
fn test_threshold_filters_before_the_handler() {
    let handler = CountingHandler::new(Severity::Error);
    let logger = Logger::builder()
        .project_id("proj-x")
        .handler(handler.clone())
        .build()
        .unwrap();
    let ctx = Context::background();

    logger.default(&ctx, "dropped", []);
    logger.debug(&ctx, "dropped", []);
    logger.info(&ctx, "dropped", []);
    logger.notice(&ctx, "dropped", []);
    logger.warn(&ctx, "dropped", []);
    assert_eq!(handler.count(), 0);

    let err = io::Error::new(io::ErrorKind::Other, "kept");
    logger.error(&ctx, &err, []);
    assert_eq!(handler.count(), 1);
    logger.emergency(&ctx, &err, []);
    assert_eq!(handler.count(), 2);
}

#[test]
fn test_json_threshold_writes_nothing_below() {
    let (logger, buffer) = json_logger(Severity::Notice, vec![]);
    let ctx = Context::background();

    logger.info(&ctx, "hidden", []);
    assert!(buffer.raw().is_empty());

    logger.notice(&ctx, "visible", []);
    assert_eq!(buffer.lines().len(), 1);
}

#[test]
fn test_insert_ids_are_unique_in_tight_loop() {
    let (logger, buffer) = json_logger(Severity::Default, vec![]);
    let ctx = Context::background();

    for _ in 0..1000 {
        logger.info(&ctx, "same message", []);
    }

    let ids: HashSet<String> = buffer
        .lines()
        .iter()
        .map(|l| l[INSERT_ID_KEY].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids.len(), 1000);
}

#[test]
fn test_error_reporting_marker() {
    let (logger, buffer) = json_logger(Severity::Default, vec![]);
    let ctx = Context::background();
    let err = query_error();

    logger.error(&ctx, &err, []);
    logger.critical(&ctx, &err, [with_error_report(false)]);
    logger.info(&ctx, "plain", []);
    logger.warn(&ctx, "opt-in", [with_error_report(true)]);

    let lines = buffer.lines();
    assert_eq!(lines[0][TYPE_KEY], REPORTED_ERROR_EVENT_TYPE);
    assert_eq!(lines[1][TYPE_KEY], REPORTED_ERROR_EVENT_TYPE);
    assert!(lines[2].get(TYPE_KEY).is_none());
    assert_eq!(lines[3][TYPE_KEY], REPORTED_ERROR_EVENT_TYPE);
}

#[test]
fn test_trace_resource_name() {
    let (logger, buffer) = json_logger(
        Severity::Default,
        vec![with_trace_id(|_| "abc123".to_string())],
    );
    logger.info(&Context::background(), "traced", []);

    let line = &buffer.lines()[0];
    assert_eq!(line[TRACE_KEY], "projects/proj-x/traces/abc123");
    assert!(line.get(SPAN_ID_KEY).is_none());
}

#[test]
fn test_span_is_never_emitted_without_trace() {
    let (logger, buffer) = json_logger(
        Severity::Default,
        vec![
            with_trace_id(|_| String::new()),
            with_span_id(|_| "0000000000000042".to_string()),
        ],
    );
    logger.info(&Context::background(), "span only", []);

    let line = &buffer.lines()[0];
    assert!(line.get(TRACE_KEY).is_none());
    assert!(line.get(SPAN_ID_KEY).is_none());
}

#[test]
fn test_trace_and_span_from_context() {
    let (logger, buffer) = json_logger(
        Severity::Default,
        vec![
            with_trace_id(trace_id_from_context),
            with_span_id(span_id_from_context),
        ],
    );

    logger.info(&traced_ctx("t-1", "s-1"), "both", []);
    logger.info(&traced_ctx("t-2", ""), "trace only", []);
    logger.info(&Context::background(), "neither", []);

    let lines = buffer.lines();
    assert_eq!(lines[0][TRACE_KEY], "projects/proj-x/traces/t-1");
    assert_eq!(lines[0][SPAN_ID_KEY], "s-1");
    assert_eq!(lines[1][TRACE_KEY], "projects/proj-x/traces/t-2");
    assert!(lines[1].get(SPAN_ID_KEY).is_none());
    assert!(lines[2].get(TRACE_KEY).is_none());
}

#[test]
fn test_cloud_trace_header_round_trip_to_output() {
    let (logger, buffer) = json_logger(
        Severity::Default,
        vec![
            with_trace_id(trace_id_from_context),
            with_span_id(span_id_from_context),
        ],
    );
    let ctx = Context::from_headers([(
        "X-Cloud-Trace-Context",
        "105445aa7843bc8bf206b12000100000/1;o=1",
    )]);

    logger.notice(&ctx, "from header", []);

    let line = &buffer.lines()[0];
    assert_eq!(
        line[TRACE_KEY],
        "projects/proj-x/traces/105445aa7843bc8bf206b12000100000"
    );
    assert_eq!(line[SPAN_ID_KEY], "1");
}

#[test]
fn test_default_renderer_prints_cause_chain() {
    let (logger, buffer) = json_logger(Severity::Default, vec![]);
    logger.error(&Context::background(), &query_error(), []);

    assert_eq!(
        buffer.lines()[0][MESSAGE_KEY],
        "query on users failed\nCaused by: connection timed out"
    );
}

#[test]
fn test_renderer_swap_affects_only_its_logger() {
    let (default_logger, default_buffer) = json_logger(Severity::Default, vec![]);
    let (custom_logger, custom_buffer) = json_logger(
        Severity::Default,
        vec![with_print_error(|e| format!("[{}]", e))],
    );
    let ctx = Context::background();
    let err = query_error();

    default_logger.error(&ctx, &err, []);
    custom_logger.error(&ctx, &err, []);
    custom_logger.alert(&ctx, &err, []);

    assert_eq!(
        default_buffer.lines()[0][MESSAGE_KEY],
        "query on users failed\nCaused by: connection timed out"
    );
    let custom = custom_buffer.lines();
    assert_eq!(custom[0][MESSAGE_KEY], "[query on users failed]");
    assert_eq!(custom[1][MESSAGE_KEY], "[query on users failed]");
}

#[test]
fn test_extra_attributes_come_last_and_may_shadow() {
    let (logger, buffer) = json_logger(Severity::Default, vec![]);
    logger.info(
        &Context::background(),
        "shadowed",
        [with_attrs([
            Attr::new("user_id", 7),
            Attr::string(INSERT_ID_KEY, "caller-chosen"),
        ])],
    );

    let raw = buffer.raw();
    let first = raw.find(INSERT_ID_KEY).unwrap();
    let second = raw.rfind(INSERT_ID_KEY).unwrap();
    assert!(first < raw.find("user_id").unwrap());
    assert!(second > raw.find("user_id").unwrap());
    assert!(raw.trim_end().ends_with("\"caller-chosen\"}"));
}

#[test]
fn test_json_file_output() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("app.jsonl");

    let handler = cloud_logging_emitter::cloud_logging_handler(
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .expect("Failed to open log file"),
        Severity::Info,
    );
    let logger = Logger::builder()
        .project_id("proj-x")
        .handler(handler)
        .build()
        .unwrap();

    logger.debug(&Context::background(), "not written", []);
    logger.info(&Context::background(), "written", []);
    logger.flush().expect("Failed to flush");

    let content = std::fs::read_to_string(&log_file).expect("Failed to read log file");
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 1);
    let parsed: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(parsed[MESSAGE_KEY], "written");
}

#[test]
fn test_concurrent_logging() {
    let (logger, buffer) = json_logger(Severity::Default, vec![]);
    let logger = Arc::new(logger);

    let mut handles = vec![];
    for thread_id in 0..8 {
        let logger = Arc::clone(&logger);
        handles.push(std::thread::spawn(move || {
            let ctx = Context::background();
            for i in 0..50 {
                logger.info(&ctx, format!("Thread {} - Message {}", thread_id, i), []);
            }
        }));
    }
    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    let lines = buffer.lines();
    assert_eq!(lines.len(), 400);
    let ids: HashSet<&str> = lines
        .iter()
        .map(|l| l[INSERT_ID_KEY].as_str().unwrap())
        .collect();
    assert_eq!(ids.len(), 400);
    assert_eq!(logger.metrics().emitted_count(), 400);
}

#[test]
fn test_source_location_names_calling_function() {
    let (logger, buffer) = json_logger(Severity::Default, vec![]);

    let line = line!() + 1;
    logger.notice(&Context::background(), "located", []);

    let source = &buffer.lines()[0][SOURCE_LOCATION_KEY];
    assert_eq!(source["file"], file!());
    assert_eq!(source["line"], line);
    let function = source["function"].as_str().expect("function is resolved");
    assert!(
        function.ends_with("test_source_location_names_calling_function"),
        "function was {}",
        function
    );
}

/// Wrapper without `#[track_caller]`, compensating with a frame skip
#[inline(never)]
fn audit(logger: &Logger, message: &str) {
    logger.info(&Context::background(), message, [with_skip_caller(1)]);
}

#[test]
fn test_skip_caller_reports_the_wrappers_caller() {
    let handler = CountingHandler::new(Severity::Default);
    let logger = Logger::builder()
        .project_id("proj-x")
        .handler(handler.clone())
        .build()
        .unwrap();

    let line = line!() + 1;
    audit(&logger, "audited");

    let records = handler.records.lock();
    let source = records[0].source.as_ref().expect("source is always set");
    assert_eq!(source.file, file!());
    assert_eq!(source.line, line);
    let function = source.function.as_deref().expect("function is resolved");
    assert!(
        function.ends_with("test_skip_caller_reports_the_wrappers_caller"),
        "function was {}",
        function
    );
}

fn flaky_logger(writer: FlakyWriter, policy: RetryPolicy) -> Logger {
    Logger::builder()
        .project_id("proj-x")
        .writer(writer)
        .retry_policy(policy)
        .build()
        .unwrap()
}

#[test]
fn test_retry_after_partial_write_emits_one_clean_line() {
    let writer = FlakyWriter::new(10, 1);
    let logger = flaky_logger(
        writer.clone(),
        RetryPolicy::Retry {
            max_attempts: 3,
            backoff: Duration::ZERO,
        },
    );
    let ctx = Context::background();

    logger.error(&ctx, &query_error(), []);
    logger.info(&ctx, "after", []);

    let lines = writer.output.lines();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0][SEVERITY_KEY], "ERROR");
    assert_eq!(lines[1][MESSAGE_KEY], "after");
    assert_eq!(logger.metrics().retry_count(), 1);
    assert_eq!(logger.metrics().emitted_count(), 2);
    assert_eq!(logger.metrics().failed_count(), 0);
}

#[test]
fn test_drop_policy_counts_writer_failures() {
    let writer = FlakyWriter::broken();
    let logger = flaky_logger(writer.clone(), RetryPolicy::Drop);
    let ctx = Context::background();

    logger.info(&ctx, "lost", []);
    logger.warn(&ctx, "also lost", []);

    assert_eq!(logger.metrics().failed_count(), 2);
    assert_eq!(logger.metrics().emitted_count(), 0);
    assert!(writer.output.raw().is_empty());
}

#[test]
fn test_drop_policy_keeps_stream_parseable_after_torn_write() {
    let writer = FlakyWriter::new(10, 1);
    let logger = flaky_logger(writer.clone(), RetryPolicy::Drop);
    let ctx = Context::background();

    logger.info(&ctx, "torn", []);
    logger.info(&ctx, "next", []);

    let messages: Vec<String> = writer
        .output
        .lines()
        .iter()
        .map(|l| l[MESSAGE_KEY].as_str().unwrap().to_string())
        .collect();
    assert_eq!(messages, ["torn", "next"]);
    assert_eq!(logger.metrics().failed_count(), 1);
    assert_eq!(logger.metrics().emitted_count(), 1);
}
