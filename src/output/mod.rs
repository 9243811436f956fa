//! Output layout and writers

use std::path::Path;

pub mod csv;
pub mod path;

pub use self::csv::{write_scrape_result, CsvTableWriter};
pub use self::path::OutputLayout;

/// Output writer errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// CSV write error
    #[error("CSV error: {0}")]
    CsvError(String),

    /// Buffer flush error
    #[error("flush error: {0}")]
    FlushError(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Generic output writer trait
pub trait OutputWriter {
    /// Flush any buffered data to disk
    fn flush(&mut self) -> OutputResult<()>;

    /// Close the writer and finalize output
    fn close(self) -> OutputResult<()>;
}

/// Writer for rows of one table
pub trait TableWriter<R>: OutputWriter {
    /// Write a single row
    fn write_row(&mut self, row: &R) -> OutputResult<()>;

    /// Write multiple rows at once
    fn write_rows<'a, I>(&mut self, rows: I) -> OutputResult<()>
    where
        I: IntoIterator<Item = &'a R>,
        R: 'a,
    {
        for row in rows {
            self.write_row(row)?;
        }
        Ok(())
    }
}

/// Create `dir` and its parents if missing
pub fn ensure_dir(dir: &Path) -> OutputResult<()> {
    std::fs::create_dir_all(dir)
        .map_err(|e| OutputError::IoError(format!("Failed to create directory {}: {e}", dir.display())))
}
