//! Panic capture bridge
//!
//! Funnels process-wide panics into the logger as `Critical` entries. The
//! previously installed hook keeps running afterwards, so the logger never
//! assumes it is the only observer of the host's unhandled-error
//! notification. The hook holds the logger weakly; once the logger is
//! dropped the hook becomes a no-op.

use std::backtrace::Backtrace;
use std::panic::{self, PanicHookInfo};
use std::sync::Weak;

use crate::entry::{LogEntry, Severity};
use crate::logger::LoggerInner;

/// Register the panic hook for a logger, chaining the previous hook
pub(crate) fn install(logger: Weak<LoggerInner>) {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        if let Some(logger) = logger.upgrade() {
            logger.dispatch(panic_entry(info));
            // Best effort: give the entry a chance to reach disk before
            // the termination already in progress continues
            logger.flush_before_abort();
        }
        previous(info);
    }));
}

/// Build a log entry from a panic's payload, location and backtrace
fn panic_entry(info: &PanicHookInfo<'_>) -> LogEntry {
    let message = payload_message(info);
    let title = match info.location() {
        Some(location) => format!("Panic at {}:{}", location.file(), location.line()),
        None => "Panic".to_string(),
    };

    LogEntry::new(Severity::Critical, title, message)
        .with_stack_trace(Backtrace::force_capture().to_string())
}

/// Extract the payload as text; panics carry `&str` or `String` payloads
/// from the `panic!` family, anything else is opaque
fn payload_message(info: &PanicHookInfo<'_>) -> String {
    if let Some(message) = info.payload().downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = info.payload().downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoggerConfig;
    use crate::logger::Logger;
    use crate::table::LogTable;
    use tempfile::TempDir;

    #[test]
    fn test_panic_in_thread_is_captured() {
        let temp_dir = TempDir::new().unwrap();
        let config = LoggerConfig::new(temp_dir.path().join("errors.log"));
        let logger = Logger::with_config(config).unwrap();

        let result = std::thread::spawn(|| panic!("kaboom: {}", 42)).join();
        assert!(result.is_err());

        logger.flush();
        let table = LogTable::load_from_file(logger.path(), true).unwrap();
        // Another test's panic may land in this file too; find our row
        let row = (0..table.len())
            .find(|&row| table.get_cell(row, 3) == Some("kaboom: 42"))
            .expect("panic entry not persisted");
        assert_eq!(table.get_cell(row, 1), Some("Critical"));
        assert!(table.get_cell(row, 2).unwrap().starts_with("Panic at"));
        assert!(!table.get_cell(row, 4).unwrap().is_empty());
    }

    #[test]
    fn test_dropped_logger_makes_hook_inert() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("errors.log");
        let logger = Logger::with_config(LoggerConfig::new(&path)).unwrap();
        drop(logger);

        let result = std::thread::spawn(|| panic!("nobody listening")).join();
        assert!(result.is_err());

        // The dropped logger must not have recorded anything
        if path.exists() {
            let table = LogTable::load_from_file(&path, true).unwrap();
            for row in 0..table.len() {
                assert_ne!(table.get_cell(row, 3), Some("nobody listening"));
            }
        }
    }
}
