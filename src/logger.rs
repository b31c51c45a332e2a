//! Logging front door and the single-writer append pipeline
//!
//! Producers enqueue entries onto a lock-free queue. The first producer to
//! find no write pass active spawns one; the pass drains the queue into the
//! in-memory history table, applies retention, overwrites the log file, and
//! re-arms itself while entries keep arriving. Producers never block on
//! file I/O, only on the queue's high-water mark.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{ensure, Context, Result};
use chrono::Local;
use crossbeam::queue::SegQueue;
use tracing::warn;

use crate::config::LoggerConfig;
use crate::entry::{LogEntry, Severity, TIME_FORMAT};
use crate::panic_hook;
use crate::retention::{retention_boundary, RetentionLimits};
use crate::table::LogTable;

/// Column headers of the persisted history table
pub const COLUMNS: [&str; 5] = [
    "Timestamp",
    "Severity",
    "Exception Type",
    "Message",
    "Stack Trace",
];

/// Queue length above which producers block until the writer catches up
const HIGH_WATER_MARK: usize = 10_000;

/// Producer backoff while the queue is above the high-water mark
const BACKPRESSURE_POLL: Duration = Duration::from_millis(100);

/// Poll interval while waiting for the writer to quiesce
const FLUSH_POLL: Duration = Duration::from_millis(10);

/// How long the panic hook waits for its entry to reach disk
const PANIC_FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// Error and event logger with a durable, bounded on-disk history
///
/// Cheap to clone; all clones share the same queue, history table and log
/// file. Logging calls never fail and never block on disk I/O.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<LoggerInner>,
}

pub(crate) struct LoggerInner {
    config: LoggerConfig,
    queue: SegQueue<LogEntry>,
    write_active: AtomicBool,
    history: Mutex<LogTable>,
}

impl Logger {
    /// Create a logger with the default configuration
    ///
    /// Persists `Critical` entries to `errors.log`, no retention limits,
    /// panic capture enabled.
    pub fn new() -> Result<Self> {
        Self::with_config(LoggerConfig::default())
    }

    /// Create a logger from an explicit configuration
    ///
    /// Creates the log directory, loads a pre-existing history file (or
    /// initializes an empty table with headers), and registers the panic
    /// hook when configured. Fails on an unwritable directory or a
    /// malformed pre-existing file.
    pub fn with_config(config: LoggerConfig) -> Result<Self> {
        if let Some(dir) = config.path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir).with_context(|| {
                    format!("failed to create log directory {}", dir.display())
                })?;
            }
        }

        let table = if config.path.exists() {
            let mut table = LogTable::load_from_file(&config.path, true)
                .with_context(|| format!("failed to load log file {}", config.path.display()))?;
            if table.column_count() == 0 && table.is_empty() {
                // A zero-byte file is a fresh history, not a malformed one
                table.set_column_names(&COLUMNS);
            }
            ensure!(
                table.column_count() == COLUMNS.len(),
                "log file {} has {} columns, expected {}",
                config.path.display(),
                table.column_count(),
                COLUMNS.len()
            );
            table
        } else {
            let mut table = LogTable::new();
            table.set_column_names(&COLUMNS);
            table
        };

        let capture_panics = config.capture_panics;
        let logger = Self {
            inner: Arc::new(LoggerInner {
                config,
                queue: SegQueue::new(),
                write_active: AtomicBool::new(false),
                history: Mutex::new(table),
            }),
        };

        if capture_panics {
            panic_hook::install(Arc::downgrade(&logger.inner));
        }

        Ok(logger)
    }

    /// Log a titled message
    ///
    /// Silently filtered against both configured thresholds; never fails.
    pub fn log(&self, severity: Severity, title: impl Into<String>, message: impl Into<String>) {
        self.inner.dispatch(LogEntry::new(severity, title, message));
    }

    /// Log a titled message at `Info`
    pub fn log_message(&self, title: impl Into<String>, message: impl Into<String>) {
        self.log(Severity::Info, title, message);
    }

    /// Log an error at `Critical`
    ///
    /// The error's short type name becomes the title and its source chain
    /// the stack-trace column.
    pub fn log_error<E>(&self, error: &E)
    where
        E: std::error::Error + ?Sized,
    {
        self.log_error_with_severity(error, Severity::Critical);
    }

    /// Log an error with an explicit severity
    pub fn log_error_with_severity<E>(&self, error: &E, severity: Severity)
    where
        E: std::error::Error + ?Sized,
    {
        self.inner.dispatch(LogEntry::from_error(error, severity));
    }

    /// Block until every enqueued entry has been persisted
    ///
    /// Kicks a write pass if entries are pending without one. A no-op when
    /// the queue is empty and no pass is active: nothing is written.
    pub fn flush(&self) {
        self.inner.wait_for_quiesce(None);
    }

    /// Path of the persisted log file
    pub fn path(&self) -> &Path {
        &self.inner.config.path
    }
}

impl LoggerInner {
    /// Severity-gate an entry into the file pipeline and diagnostic sink
    ///
    /// The two threshold checks are independent; an entry can go to one
    /// sink, both, or neither.
    pub(crate) fn dispatch(self: &Arc<Self>, entry: LogEntry) {
        if entry.severity >= self.config.debug_level {
            write_debug(&entry);
        }
        if entry.severity >= self.config.file_level {
            self.enqueue(entry);
        }
    }

    /// Enqueue an entry and make sure a write pass exists
    ///
    /// Blocks while the queue is above the high-water mark; entries are
    /// never dropped.
    fn enqueue(self: &Arc<Self>, entry: LogEntry) {
        while self.queue.len() > HIGH_WATER_MARK {
            thread::sleep(BACKPRESSURE_POLL);
        }
        self.queue.push(entry);
        self.spawn_writer_if_idle();
    }

    /// Start a drain pass unless one is already active
    fn spawn_writer_if_idle(self: &Arc<Self>) {
        if self
            .write_active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            let inner = Arc::clone(self);
            thread::spawn(move || inner.run_write_passes());
        }
    }

    /// Drain passes until the queue stays empty
    ///
    /// The write-active flag is held on entry. It is released *before* the
    /// emptiness re-check: an entry enqueued during the write either gets
    /// picked up by re-acquiring the flag here, or its producer starts a
    /// fresh pass after observing the released flag.
    fn run_write_passes(&self) {
        loop {
            self.drain_pass();
            self.write_active.store(false, Ordering::Release);
            if self.queue.is_empty() {
                break;
            }
            if self
                .write_active
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                break;
            }
        }
    }

    /// One cycle: merge pending entries, apply retention, persist
    ///
    /// A failed file write is reported to the diagnostic sink only; the
    /// table and queue stay intact so the next pass retries.
    fn drain_pass(&self) {
        let mut history = self.history.lock().unwrap_or_else(|e| e.into_inner());

        while let Some(entry) = self.queue.pop() {
            history.append_record(entry.into_record());
        }

        let limits = RetentionLimits {
            max_age: self.config.history_duration,
            max_size_kb: self.config.max_size_kb,
        };
        if let Some(boundary) = retention_boundary(&history, &limits, Local::now().naive_local()) {
            history.truncate_oldest(boundary);
        }

        if let Err(err) = history.write_to_file(&self.config.path) {
            warn!(
                "could not write log file {}: {err}",
                self.config.path.display()
            );
        }
    }

    /// Wait until the queue is empty and no pass is active
    pub(crate) fn wait_for_quiesce(self: &Arc<Self>, timeout: Option<Duration>) {
        let deadline = timeout.map(|t| Instant::now() + t);
        loop {
            if self.queue.is_empty() && !self.write_active.load(Ordering::Acquire) {
                return;
            }
            if !self.queue.is_empty() {
                self.spawn_writer_if_idle();
            }
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    return;
                }
            }
            thread::sleep(FLUSH_POLL);
        }
    }

    /// Bounded flush used by the panic hook
    pub(crate) fn flush_before_abort(self: &Arc<Self>) {
        self.wait_for_quiesce(Some(PANIC_FLUSH_TIMEOUT));
    }
}

/// Emit an entry to the diagnostic sink
///
/// Best-effort and never read back; maps severities onto tracing levels.
fn write_debug(entry: &LogEntry) {
    let time = entry.time.format(TIME_FORMAT);
    match entry.severity {
        Severity::Info => tracing::info!("{time} Info: {} - {}", entry.title, entry.message),
        Severity::Warning => {
            tracing::warn!("{time} Warning: {} - {}", entry.title, entry.message)
        }
        Severity::Critical => {
            tracing::error!("{time} Critical: {} - {}", entry.title, entry.message)
        }
    }
}
