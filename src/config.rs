//! Logger configuration

use std::path::PathBuf;
use std::time::Duration;

use crate::entry::Severity;

/// Configuration for a [`Logger`](crate::Logger)
///
/// Immutable once the logger is constructed. All fields have defaults, so
/// `LoggerConfig::default()` yields a logger that persists `Critical`
/// entries to `errors.log` with no retention limits.
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Path of the persisted log file
    pub path: PathBuf,
    /// Entries older than this are evicted during a drain pass
    pub history_duration: Option<Duration>,
    /// Maximum serialized size of the history in kilobytes; older entries
    /// are evicted once the table grows past it
    pub max_size_kb: Option<u64>,
    /// Minimum severity persisted to the log file
    pub file_level: Severity,
    /// Minimum severity emitted to the diagnostic sink
    pub debug_level: Severity,
    /// Register a panic hook that records unhandled panics as Critical
    pub capture_panics: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("errors.log"),
            history_duration: None,
            max_size_kb: None,
            file_level: Severity::Critical,
            debug_level: Severity::Warning,
            capture_panics: true,
        }
    }
}

impl LoggerConfig {
    /// Create a config writing to the given path, defaults otherwise
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Evict entries older than the given duration
    pub fn with_history_duration(mut self, duration: Duration) -> Self {
        self.history_duration = Some(duration);
        self
    }

    /// Evict oldest entries once the serialized history exceeds this many KB
    pub fn with_max_size_kb(mut self, max_size_kb: u64) -> Self {
        self.max_size_kb = Some(max_size_kb);
        self
    }

    /// Set the minimum severity persisted to file
    pub fn with_file_level(mut self, level: Severity) -> Self {
        self.file_level = level;
        self
    }

    /// Set the minimum severity emitted to the diagnostic sink
    pub fn with_debug_level(mut self, level: Severity) -> Self {
        self.debug_level = level;
        self
    }

    /// Enable or disable the panic capture hook
    pub fn with_capture_panics(mut self, capture: bool) -> Self {
        self.capture_panics = capture;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LoggerConfig::default();
        assert_eq!(config.path, PathBuf::from("errors.log"));
        assert!(config.history_duration.is_none());
        assert!(config.max_size_kb.is_none());
        assert_eq!(config.file_level, Severity::Critical);
        assert_eq!(config.debug_level, Severity::Warning);
        assert!(config.capture_panics);
    }

    #[test]
    fn test_builder_setters() {
        let config = LoggerConfig::new("logs/app-errors.log")
            .with_history_duration(Duration::from_secs(3600))
            .with_max_size_kb(256)
            .with_file_level(Severity::Info)
            .with_debug_level(Severity::Critical)
            .with_capture_panics(false);

        assert_eq!(config.path, PathBuf::from("logs/app-errors.log"));
        assert_eq!(config.history_duration, Some(Duration::from_secs(3600)));
        assert_eq!(config.max_size_kb, Some(256));
        assert_eq!(config.file_level, Severity::Info);
        assert_eq!(config.debug_level, Severity::Critical);
        assert!(!config.capture_panics);
    }
}
