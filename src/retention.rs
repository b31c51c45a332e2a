//! Log history retention
//!
//! Decides how many of the oldest rows must be evicted to keep the history
//! within the configured age and size limits. The writer runs this once per
//! drain pass, after new entries are merged and before the table is
//! persisted.

use std::time::Duration;

use chrono::NaiveDateTime;
use tracing::warn;

use crate::entry::TIME_FORMAT;
use crate::table::LogTable;

/// Age and size limits applied to the history table
#[derive(Debug, Clone, Copy, Default)]
pub struct RetentionLimits {
    /// Rows older than this are evicted
    pub max_age: Option<Duration>,
    /// Trailing serialized size cap in kilobytes
    pub max_size_kb: Option<u64>,
}

impl RetentionLimits {
    /// Whether any limit is configured
    pub fn is_active(&self) -> bool {
        self.max_age.is_some() || self.max_size_kb.is_some()
    }
}

/// Find the oldest row index that must be truncated
///
/// Scans from the newest row backward, accumulating the serialized byte
/// size of each row. The first row whose timestamp is older than
/// `now - max_age`, or whose cumulative trailing size exceeds
/// `max_size_kb`, is the boundary: rows `0..=boundary` must go. Only one
/// boundary is computed per pass; the scan stops at the first trigger.
///
/// Returns `None` when no limit is configured or every row fits.
pub fn retention_boundary(
    table: &LogTable,
    limits: &RetentionLimits,
    now: NaiveDateTime,
) -> Option<usize> {
    if !limits.is_active() || table.is_empty() {
        return None;
    }

    let cutoff = limits
        .max_age
        .and_then(|age| chrono::Duration::from_std(age).ok())
        .map(|age| now - age);

    let mut trailing_bytes: u64 = 0;
    for row in (0..table.len()).rev() {
        if let Some(cutoff) = cutoff {
            let cell = table.get_cell(row, 0).unwrap_or("");
            match NaiveDateTime::parse_from_str(cell, TIME_FORMAT) {
                Ok(timestamp) if timestamp < cutoff => return Some(row),
                Ok(_) => {}
                Err(err) => {
                    // Hand-edited files can hold junk; treat as not expired
                    warn!(row, %err, "unparseable timestamp in log history, skipping age check");
                }
            }
        }

        if let Some(max_size_kb) = limits.max_size_kb {
            trailing_bytes += serialized_row_bytes(table, row);
            if trailing_bytes / 1024 > max_size_kb {
                return Some(row);
            }
        }
    }

    None
}

/// Byte length of a row's cells joined by single spaces
fn serialized_row_bytes(table: &LogTable, row: usize) -> u64 {
    let Some(record) = table.get_record(row) else {
        return 0;
    };
    let cells: usize = record.iter().map(String::len).sum();
    (cells + record.len().saturating_sub(1)) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;

    const NOW: &str = "2026-08-06 12:00:00";

    fn now() -> NaiveDateTime {
        NaiveDateTime::parse_from_str(NOW, TIME_FORMAT).unwrap()
    }

    fn table_with_timestamps(timestamps: &[&str]) -> LogTable {
        let mut table = LogTable::new();
        table.set_column_names(&["Timestamp", "Severity", "Message"]);
        for ts in timestamps {
            table.append_record(vec![ts.to_string(), "Info".into(), "msg".into()]);
        }
        table
    }

    #[test]
    fn test_no_limits_no_boundary() {
        let table = table_with_timestamps(&["2020-01-01 00:00:00"]);
        let boundary = retention_boundary(&table, &RetentionLimits::default(), now());
        assert_eq!(boundary, None);
    }

    #[test]
    fn test_empty_table_no_boundary() {
        let table = table_with_timestamps(&[]);
        let limits = RetentionLimits {
            max_age: Some(Duration::from_secs(60)),
            max_size_kb: Some(1),
        };
        assert_eq!(retention_boundary(&table, &limits, now()), None);
    }

    #[test]
    fn test_age_boundary_at_newest_stale_row() {
        let table = table_with_timestamps(&[
            "2026-08-06 09:00:00",
            "2026-08-06 10:00:00",
            "2026-08-06 11:30:00",
            "2026-08-06 11:45:00",
        ]);
        // One-hour window: rows 0 and 1 are stale, boundary is row 1
        let limits = RetentionLimits {
            max_age: Some(Duration::from_secs(3600)),
            max_size_kb: None,
        };
        assert_eq!(retention_boundary(&table, &limits, now()), Some(1));
    }

    #[test]
    fn test_age_all_rows_fresh() {
        let table = table_with_timestamps(&["2026-08-06 11:30:00", "2026-08-06 11:59:00"]);
        let limits = RetentionLimits {
            max_age: Some(Duration::from_secs(3600)),
            max_size_kb: None,
        };
        assert_eq!(retention_boundary(&table, &limits, now()), None);
    }

    #[test]
    fn test_size_boundary() {
        let mut table = LogTable::new();
        table.set_column_names(&["Timestamp", "Severity", "Message"]);
        // Each row serializes to roughly 600 bytes
        for _ in 0..10 {
            table.append_record(vec![
                "2026-08-06 11:59:00".into(),
                "Info".into(),
                "x".repeat(575),
            ]);
        }

        let limits = RetentionLimits {
            max_age: None,
            max_size_kb: Some(1),
        };
        // Scanning from row 9 backward, the cumulative size first exceeds
        // 1 KB (integer division) at row 6
        assert_eq!(retention_boundary(&table, &limits, now()), Some(6));
    }

    #[test]
    fn test_size_within_limit() {
        let table = table_with_timestamps(&["2026-08-06 11:59:00"; 5]);
        let limits = RetentionLimits {
            max_age: None,
            max_size_kb: Some(64),
        };
        assert_eq!(retention_boundary(&table, &limits, now()), None);
    }

    #[test]
    fn test_unparseable_timestamp_is_not_expired() {
        let table = table_with_timestamps(&["not a timestamp", "2026-08-06 11:59:00"]);
        let limits = RetentionLimits {
            max_age: Some(Duration::from_secs(3600)),
            max_size_kb: None,
        };
        assert_eq!(retention_boundary(&table, &limits, now()), None);
    }

    #[test]
    fn test_age_works_against_wall_clock() {
        // The writer passes Local::now(); make sure the comparison holds
        // for real clock values too
        let stale = (Local::now() - chrono::Duration::hours(2))
            .format(TIME_FORMAT)
            .to_string();
        let fresh = Local::now().format(TIME_FORMAT).to_string();
        let table = table_with_timestamps(&[&stale, &fresh]);

        let limits = RetentionLimits {
            max_age: Some(Duration::from_secs(3600)),
            max_size_kb: None,
        };
        let boundary = retention_boundary(&table, &limits, Local::now().naive_local());
        assert_eq!(boundary, Some(0));
    }
}
