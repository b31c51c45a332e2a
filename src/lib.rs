//! Crashlog - embeddable crash and error history logger
//!
//! Persists structured log entries to a delimited tabular file with a
//! bounded history: entries are evicted by age and/or cumulative size.
//! Logging calls are severity-filtered, never fail, and never block on
//! file I/O; a single background write pass drains a lock-free queue,
//! applies retention and overwrites the log file. Unhandled panics are
//! captured process-wide and recorded as `Critical` entries.

pub mod config;
pub mod entry;
pub mod logger;
mod panic_hook;
pub mod retention;
pub mod table;

pub use config::LoggerConfig;
pub use entry::{LogEntry, Severity};
pub use logger::Logger;
pub use table::{LogTable, TableError};
