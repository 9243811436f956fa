//! CLI error types and conversions

use crate::downloader::ScrapeError;
use crate::output::OutputError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Scrape error
    #[error("scrape error: {0}")]
    ScrapeError(#[from] ScrapeError),

    /// Output error
    #[error("output error: {0}")]
    OutputError(#[from] OutputError),
}
