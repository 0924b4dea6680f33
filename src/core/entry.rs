//! Pending log entries and their modifiers

use super::attr::Attr;
use super::severity::Severity;

/// Field-level modifier applied when building an [`Entry`]
///
/// Modifiers are applied in order; a later modifier for the same field
/// replaces an earlier one.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryOption {
    Attrs(Vec<Attr>),
    SkipCaller(usize),
    ErrorReport(bool),
}

/// Set the extra attributes of the entry, replacing any set earlier
pub fn with_attrs<I>(attrs: I) -> EntryOption
where
    I: IntoIterator<Item = Attr>,
{
    EntryOption::Attrs(attrs.into_iter().collect())
}

/// Skip additional stack frames when resolving the call site
///
/// Use this from wrapper functions that cannot carry `#[track_caller]`, so
/// the record points at the wrapper's caller instead of the wrapper.
pub fn with_skip_caller(skip: usize) -> EntryOption {
    EntryOption::SkipCaller(skip)
}

/// Set whether the entry is routed to Error Reporting
pub fn with_error_report(report: bool) -> EntryOption {
    EntryOption::ErrorReport(report)
}

/// One pending log record
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    severity: Severity,
    message: String,
    attrs: Vec<Attr>,
    skip_caller: usize,
    error_report: bool,
}

impl Entry {
    pub fn new<I>(severity: Severity, message: impl Into<String>, opts: I) -> Self
    where
        I: IntoIterator<Item = EntryOption>,
    {
        let mut entry = Self {
            severity,
            message: message.into(),
            attrs: Vec::new(),
            skip_caller: 0,
            error_report: false,
        };
        for opt in opts {
            entry.apply(opt);
        }
        entry
    }

    fn apply(&mut self, opt: EntryOption) {
        match opt {
            EntryOption::Attrs(attrs) => self.attrs = attrs,
            EntryOption::SkipCaller(skip) => self.skip_caller = skip,
            EntryOption::ErrorReport(report) => self.error_report = report,
        }
    }

    /// Force the error-report flag, regardless of modifiers
    pub(crate) fn report_error(mut self) -> Self {
        self.error_report = true;
        self
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn attrs(&self) -> &[Attr] {
        &self.attrs
    }

    pub fn skip_caller(&self) -> usize {
        self.skip_caller
    }

    pub fn error_report(&self) -> bool {
        self.error_report
    }

    pub(crate) fn into_parts(self) -> (Severity, String, Vec<Attr>) {
        (self.severity, self.message, self.attrs)
    }
}
