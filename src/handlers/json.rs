//! JSON handler for structured logging
//!
//! Writes each record as a single-line JSON object (JSONL). Built-in fields
//! come first (`time`, `level`, `source`, `msg`), then the record's
//! attributes in order. Duplicate keys are written as-is.
//!
//! A write that fails part-way through a line leaves the unwritten tail
//! pending. The next `handle` finishes that line before anything else, so
//! the stream never holds a torn or spliced record.

use crate::core::{Attr, Context, FieldValue, Handler, LoggerError, Record, Result, Severity};
use chrono::SecondsFormat;
use parking_lot::Mutex;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

pub const TIME_KEY: &str = "time";
pub const LEVEL_KEY: &str = "level";
pub const SOURCE_KEY: &str = "source";
pub const MESSAGE_KEY: &str = "msg";

/// Rewrites a built-in attribute before it is encoded
///
/// Returning an attribute with an empty key drops it.
pub type ReplaceAttr = Arc<dyn Fn(Attr) -> Attr + Send + Sync>;

#[derive(Clone, Default)]
pub struct HandlerOptions {
    /// Records below this severity are not output
    pub min_severity: Severity,
    /// Include the `source` object when the record has one
    pub add_source: bool,
    /// Applied to the built-in attributes only, never to record attributes
    pub replace_attr: Option<ReplaceAttr>,
}

impl fmt::Debug for HandlerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerOptions")
            .field("min_severity", &self.min_severity)
            .field("add_source", &self.add_source)
            .field("replace_attr", &self.replace_attr.is_some())
            .finish()
    }
}

/// JSON-lines handler over any writer
pub struct JsonHandler<W: Write + Send> {
    output: Mutex<Sink<W>>,
    options: HandlerOptions,
}

/// Writer plus the line a failed write left unfinished
struct Sink<W> {
    writer: W,
    /// Encoded line and how many of its bytes reached the writer
    pending: Option<(Vec<u8>, usize)>,
}

impl<W: Write> Sink<W> {
    /// Write `line[written..]`, keeping it pending if the writer fails mid-line
    fn write_line(&mut self, line: Vec<u8>, mut written: usize) -> io::Result<()> {
        while written < line.len() {
            let err = match self.writer.write(&line[written..]) {
                Ok(0) => io::Error::new(io::ErrorKind::WriteZero, "failed to write whole line"),
                Ok(n) => {
                    written += n;
                    continue;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => e,
            };
            if written > 0 {
                self.pending = Some((line, written));
            }
            return Err(err);
        }
        Ok(())
    }
}

impl<W: Write + Send> JsonHandler<W> {
    pub fn new(writer: W, options: HandlerOptions) -> Self {
        Self {
            output: Mutex::new(Sink {
                writer,
                pending: None,
            }),
            options,
        }
    }

    /// Whether a failed write left a line partially written
    pub fn has_pending(&self) -> bool {
        self.output.lock().pending.is_some()
    }

    pub fn options(&self) -> &HandlerOptions {
        &self.options
    }

    /// Encode one record, including the trailing newline
    pub fn encode(&self, record: &Record) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(256);
        let mut first = true;
        buf.push(b'{');

        for attr in self.builtin_attrs(record) {
            let attr = match &self.options.replace_attr {
                Some(replace) => replace(attr),
                None => attr,
            };
            if attr.key.is_empty() {
                continue;
            }
            write_attr(&mut buf, &attr, &mut first)?;
        }
        for attr in record.attrs() {
            write_attr(&mut buf, attr, &mut first)?;
        }

        buf.extend_from_slice(b"}\n");
        Ok(buf)
    }

    fn builtin_attrs(&self, record: &Record) -> Vec<Attr> {
        let mut attrs = Vec::with_capacity(4);
        attrs.push(Attr::string(
            TIME_KEY,
            record.time.to_rfc3339_opts(SecondsFormat::Nanos, true),
        ));
        attrs.push(Attr::string(LEVEL_KEY, record.severity.as_str()));
        if self.options.add_source {
            if let Some(source) = &record.source {
                attrs.push(Attr::group(SOURCE_KEY, source.to_attrs()));
            }
        }
        attrs.push(Attr::string(MESSAGE_KEY, record.message.as_str()));
        attrs
    }
}

impl JsonHandler<BufWriter<File>> {
    /// Append JSON lines to the file at `path`, creating it if needed
    pub fn open<P: AsRef<Path>>(path: P, options: HandlerOptions) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                LoggerError::config("JsonHandler", format!("{}: {}", path.display(), e))
            })?;
        Ok(Self::new(BufWriter::new(file), options))
    }
}

impl<W: Write + Send> Handler for JsonHandler<W> {
    fn enabled(&self, _ctx: &Context, severity: Severity) -> bool {
        severity >= self.options.min_severity
    }

    fn handle(&self, _ctx: &Context, record: &Record) -> Result<()> {
        let line = self.encode(record)?;
        let mut output = self.output.lock();

        if let Some((pending, written)) = output.pending.take() {
            // A retry of the same record only needs the rest of its line.
            let resubmitted = pending == line;
            output.write_line(pending, written)?;
            if resubmitted {
                output.writer.flush()?;
                return Ok(());
            }
        }

        output.write_line(line, 0)?;
        output.writer.flush()?;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        let mut output = self.output.lock();
        if let Some((pending, written)) = output.pending.take() {
            output.write_line(pending, written)?;
        }
        output.writer.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "json"
    }
}

fn write_attr(buf: &mut Vec<u8>, attr: &Attr, first: &mut bool) -> Result<()> {
    if !*first {
        buf.push(b',');
    }
    *first = false;
    serde_json::to_writer(&mut *buf, &attr.key)?;
    buf.push(b':');
    write_value(buf, &attr.value)
}

fn write_value(buf: &mut Vec<u8>, value: &FieldValue) -> Result<()> {
    match value {
        FieldValue::Group(attrs) => {
            let mut first = true;
            buf.push(b'{');
            for attr in attrs {
                write_attr(buf, attr, &mut first)?;
            }
            buf.push(b'}');
        }
        other => serde_json::to_writer(&mut *buf, &other.to_json_value())?,
    }
    Ok(())
}
