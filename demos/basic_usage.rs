//! Basic emitter usage example
//!
//! Writes Cloud Logging JSON lines to stdout at every severity, with trace
//! correlation taken from an `X-Cloud-Trace-Context` header.
//!
//! Run with: cargo run --example basic_usage

use cloud_logging_emitter::prelude::*;
use std::io;

fn main() -> Result<()> {
    let logger = Logger::new(
        io::stdout(),
        "my-project",
        Severity::Debug,
        [
            with_trace_id(trace_id_from_context),
            with_span_id(span_id_from_context),
        ],
    )?;

    let ctx = Context::from_headers([(
        "X-Cloud-Trace-Context",
        "105445aa7843bc8bf206b12000100000/1;o=1",
    )]);

    // Below the threshold: nothing is written
    logger.default(&ctx, "This default entry is filtered", []);

    logger.debug(&ctx, "Loading configuration", []);
    logger.info(
        &ctx,
        "Request served",
        [with_attrs([
            Attr::string("method", "GET"),
            Attr::new("status", 200),
            Attr::group("latency", vec![Attr::new("ms", 12)]),
        ])],
    );
    logger.notice(&ctx, "Cache warmed", []);
    logger.warn(&ctx, "Slow upstream response", []);

    // Error levels render the error and mark the entry for Error Reporting
    let err = io::Error::new(io::ErrorKind::ConnectionRefused, "payments backend refused connection");
    logger.error(&ctx, &err, []);
    logger.critical(&ctx, &err, [with_attrs([Attr::string("backend", "payments")])]);

    logger.flush()?;
    eprintln!(
        "emitted {} entries, filtered {}",
        logger.metrics().emitted_count(),
        logger.metrics().filtered_count()
    );
    Ok(())
}
