//! Delimited tabular storage for the log history
//!
//! Ordered rows of string cells with named columns, persisted as a CSV file
//! with a header row. Row order is insertion order; row 0 is the oldest
//! surviving entry. Quoting is handled by the `csv` crate, so embedded
//! commas and multi-line stack traces round-trip.

use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};
use thiserror::Error;

/// Errors produced by table load/save
#[derive(Debug, Error)]
pub enum TableError {
    #[error("table file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed table file: {0}")]
    Malformed(#[from] csv::Error),

    #[error("row {row} has {found} cells, expected {expected}")]
    ColumnMismatch {
        row: usize,
        found: usize,
        expected: usize,
    },
}

/// An ordered collection of string rows with named columns
#[derive(Debug, Default, Clone)]
pub struct LogTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl LogTable {
    /// Create an empty table with no columns
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a table from a delimited file
    ///
    /// With `has_headers`, the first row becomes the column names. Every
    /// data row must have exactly as many cells as the header, otherwise
    /// [`TableError::ColumnMismatch`] is returned.
    pub fn load_from_file(path: &Path, has_headers: bool) -> Result<Self, TableError> {
        // Read raw records so short rows surface as ColumnMismatch
        // instead of a csv-internal error.
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)?;

        let mut table = Self::new();
        for (index, record) in reader.records().enumerate() {
            let record = record?;
            let cells: Vec<String> = record.iter().map(str::to_string).collect();

            if has_headers && table.columns.is_empty() {
                table.columns = cells;
                continue;
            }

            if !table.columns.is_empty() && cells.len() != table.columns.len() {
                return Err(TableError::ColumnMismatch {
                    row: index,
                    found: cells.len(),
                    expected: table.columns.len(),
                });
            }
            table.rows.push(cells);
        }

        Ok(table)
    }

    /// Write the whole table to a file, overwriting any previous content
    pub fn write_to_file(&self, path: &Path) -> Result<(), TableError> {
        let mut writer = WriterBuilder::new().from_path(path)?;
        if !self.columns.is_empty() {
            writer.write_record(&self.columns)?;
        }
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Set the column names of an empty table
    pub fn set_column_names(&mut self, names: &[&str]) {
        self.columns = names.iter().map(|n| n.to_string()).collect();
    }

    /// Number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// The column names, in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Append a row at the newest end
    pub fn append_record(&mut self, values: Vec<String>) {
        debug_assert!(self.columns.is_empty() || values.len() == self.columns.len());
        self.rows.push(values);
    }

    /// Remove the row at `index`
    pub fn remove_record(&mut self, index: usize) {
        if index < self.rows.len() {
            self.rows.remove(index);
        }
    }

    /// Remove rows `0..=boundary` in one pass
    ///
    /// Bulk form of removing the oldest rows one at a time.
    pub fn truncate_oldest(&mut self, boundary: usize) {
        let end = boundary.min(self.rows.len().saturating_sub(1));
        if !self.rows.is_empty() {
            self.rows.drain(0..=end);
        }
    }

    /// Read one cell, or `None` when out of bounds
    pub fn get_cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row)?.get(column).map(String::as_str)
    }

    /// Read one row, or `None` when out of bounds
    pub fn get_record(&self, row: usize) -> Option<&[String]> {
        self.rows.get(row).map(Vec::as_slice)
    }

    /// Number of data rows (the header is not counted)
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no data rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
