//! Shared helpers for integration tests

#![allow(dead_code)]

use cloud_logging_emitter::prelude::*;
use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// In-memory writer that can be inspected while a logger owns a clone
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn lines(&self) -> Vec<serde_json::Value> {
        let bytes = self.0.lock().clone();
        String::from_utf8(bytes)
            .expect("output is UTF-8")
            .lines()
            .map(|line| serde_json::from_str(line).expect("each line is JSON"))
            .collect()
    }

    pub fn raw(&self) -> String {
        String::from_utf8(self.0.lock().clone()).expect("output is UTF-8")
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Writer that accepts `budget` bytes, then fails `failures` writes,
/// then accepts everything
#[derive(Clone)]
pub struct FlakyWriter {
    pub output: SharedBuffer,
    budget: Arc<Mutex<Option<usize>>>,
    failures: Arc<Mutex<usize>>,
}

impl FlakyWriter {
    pub fn new(budget: usize, failures: usize) -> Self {
        Self {
            output: SharedBuffer::default(),
            budget: Arc::new(Mutex::new(Some(budget))),
            failures: Arc::new(Mutex::new(failures)),
        }
    }

    /// Never accepts a byte
    pub fn broken() -> Self {
        Self::new(0, usize::MAX)
    }
}

impl Write for FlakyWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut budget = self.budget.lock();
        let n = match *budget {
            Some(0) => {
                let mut failures = self.failures.lock();
                if *failures > 0 {
                    *failures -= 1;
                    return Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"));
                }
                *budget = None;
                buf.len()
            }
            Some(left) => {
                let n = left.min(buf.len());
                *budget = Some(left - n);
                n
            }
            None => buf.len(),
        };
        self.output.0.lock().extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Counts calls and keeps every record it receives
#[derive(Clone)]
pub struct CountingHandler {
    pub min_severity: Severity,
    pub handled: Arc<AtomicUsize>,
    pub records: Arc<Mutex<Vec<Record>>>,
}

impl CountingHandler {
    pub fn new(min_severity: Severity) -> Self {
        Self {
            min_severity,
            handled: Arc::new(AtomicUsize::new(0)),
            records: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn count(&self) -> usize {
        self.handled.load(Ordering::SeqCst)
    }
}

impl Handler for CountingHandler {
    fn enabled(&self, _ctx: &Context, severity: Severity) -> bool {
        severity >= self.min_severity
    }

    fn handle(&self, _ctx: &Context, record: &Record) -> Result<()> {
        self.handled.fetch_add(1, Ordering::SeqCst);
        self.records.lock().push(record.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "counting"
    }
}

pub fn json_logger(min_severity: Severity, opts: Vec<LoggerOption>) -> (Logger, SharedBuffer) {
    let buffer = SharedBuffer::default();
    let logger = Logger::new(buffer.clone(), "proj-x", min_severity, opts)
        .expect("valid configuration");
    (logger, buffer)
}
