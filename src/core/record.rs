//! Fully populated records, as handed to a [`Handler`](super::Handler)

use super::attr::{Attr, FieldValue};
use super::severity::Severity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Logical call site of a log statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    pub file: String,
    pub line: u32,
}

impl SourceLocation {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            function: None,
            file: file.into(),
            line,
        }
    }

    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = Some(function.into());
        self
    }

    /// Attributes in the order slog-style encoders emit them
    pub fn to_attrs(&self) -> Vec<Attr> {
        let mut attrs = Vec::with_capacity(3);
        if let Some(function) = &self.function {
            attrs.push(Attr::string("function", function.as_str()));
        }
        attrs.push(Attr::string("file", self.file.as_str()));
        attrs.push(Attr::new("line", FieldValue::Int(i64::from(self.line))));
        attrs
    }
}

/// A log record ready for encoding
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub time: DateTime<Utc>,
    pub severity: Severity,
    pub message: String,
    pub source: Option<SourceLocation>,
    attrs: Vec<Attr>,
}

impl Record {
    pub fn new(
        time: DateTime<Utc>,
        severity: Severity,
        message: impl Into<String>,
        source: Option<SourceLocation>,
    ) -> Self {
        Self {
            time,
            severity,
            message: message.into(),
            source,
            attrs: Vec::new(),
        }
    }

    /// Append attributes, keeping any already present
    pub fn add_attrs<I>(&mut self, attrs: I)
    where
        I: IntoIterator<Item = Attr>,
    {
        self.attrs.extend(attrs);
    }

    pub fn attrs(&self) -> &[Attr] {
        &self.attrs
    }

    /// First attribute with the given key
    pub fn attr(&self, key: &str) -> Option<&FieldValue> {
        self.attrs.iter().find(|a| a.key == key).map(|a| &a.value)
    }
}
