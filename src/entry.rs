//! Log entry model
//!
//! Defines the severity scale and the immutable record that flows from the
//! logging front door into the persisted history table.

use chrono::{DateTime, Local};

/// Timestamp pattern used for both writing and parsing table cells
///
/// Locale-invariant so persisted rows round-trip through retention scans.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Severity of a log event
///
/// Ordered by increasing seriousness, so threshold checks can use `>=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Informational message about coarse-grained application progress
    Info,
    /// Potentially harmful situation, application still running as expected
    Warning,
    /// Severe error event that will likely lead the application to abort
    Critical,
}

impl Severity {
    /// Get the display name for this severity
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "Info",
            Severity::Warning => "Warning",
            Severity::Critical => "Critical",
        }
    }

    /// Parse a severity from its display name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Info" => Some(Severity::Info),
            "Warning" => Some(Severity::Warning),
            "Critical" => Some(Severity::Critical),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single log record
///
/// Immutable once constructed; created by the front door at call time and
/// consumed when the writer merges it into the history table.
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// How serious the event is
    pub severity: Severity,
    /// Short title, or the error type name for captured errors
    pub title: String,
    /// The descriptive message
    pub message: String,
    /// Backtrace or error source chain, if any
    pub stack_trace: Option<String>,
    /// When the event was recorded
    pub time: DateTime<Local>,
}

impl LogEntry {
    /// Create a new entry timestamped now
    pub fn new(severity: Severity, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            title: title.into(),
            message: message.into(),
            stack_trace: None,
            time: Local::now(),
        }
    }

    /// Attach a stack trace or source chain to the entry
    pub fn with_stack_trace(mut self, stack_trace: impl Into<String>) -> Self {
        self.stack_trace = Some(stack_trace.into());
        self
    }

    /// Build an entry from an error, using the error's short type name as
    /// the title and its source chain as the stack-trace column
    pub fn from_error<E>(error: &E, severity: Severity) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        let mut chain = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            chain.push(format!("caused by: {cause}"));
            source = cause.source();
        }

        let mut entry = Self::new(severity, short_type_name::<E>(), error.to_string());
        if !chain.is_empty() {
            entry.stack_trace = Some(chain.join("\n"));
        }
        entry
    }

    /// Serialize into the table's column order:
    /// Timestamp, Severity, Exception Type, Message, Stack Trace
    pub(crate) fn into_record(self) -> Vec<String> {
        vec![
            self.time.format(TIME_FORMAT).to_string(),
            self.severity.to_string(),
            self.title,
            self.message,
            self.stack_trace.unwrap_or_default(),
        ]
    }
}

/// Last path segment of a type name, e.g. `std::io::Error` -> `Error`
fn short_type_name<E: ?Sized>() -> &'static str {
    let full = std::any::type_name::<E>();
    full.rsplit("::").next().unwrap_or(full)
}
