//! Attachment downloads and scrape orchestration
//!
//! # Overview
//!
//! A scrape runs strictly in sequence:
//!
//! 1. **Feedback**: walk the listing with [`crate::fetcher::Paginator`]
//! 2. **Statistics**: fetch the per-country and per-category counts
//! 3. **Attachments**: unless disabled, download every referenced file with
//!    [`attachments::AttachmentDownloader`]
//!
//! All requests share one [`rate_limit::RateLimiter`], so no two requests ever
//! overlap and consecutive requests are at least the configured delay apart.
//!
//! # Error Handling
//!
//! A failure in steps 1 or 2 aborts the scrape with a [`ScrapeError`]. A
//! failure downloading one attachment is recorded as
//! [`AttachmentOutcome::Failed`] and the remaining attachments are still
//! attempted.
//!
//! # Components
//!
//! - [`scraper`] - Orchestrator and result type
//! - [`attachments`] - Per-file downloads with partial-failure tolerance
//! - [`rate_limit`] - Minimum delay between requests
//! - [`config`] - Configuration and constants

pub mod attachments;
pub mod config;
pub mod rate_limit;
pub mod scraper;

pub use attachments::{AttachmentDownloader, AttachmentOutcome, AttachmentRecord};
pub use config::ScraperConfig;
pub use rate_limit::{RateLimiter, RequestPermit};
pub use scraper::{ScrapePhase, ScrapeResult, Scraper};

use crate::fetcher::FetcherError;

/// Errors downloading a single attachment
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// Request failed
    #[error("request error: {0}")]
    RequestError(#[from] FetcherError),

    /// Local write failed
    #[error("file write error: {0}")]
    FileWriteError(String),

    /// Another attachment already maps to the same local file
    #[error("file name {file_name} is already used by attachment {owner}")]
    FileNameCollision {
        /// Local file name both attachments map to
        file_name: String,
        /// Attachment that claimed the name first
        owner: String,
    },
}

/// Errors that abort a scrape
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// A listing or statistics request failed
    #[error("request error while {phase}: {source}")]
    RequestError {
        /// Phase the scrape was in
        phase: ScrapePhase,
        /// Underlying failure
        #[source]
        source: FetcherError,
    },

    /// Attachment folder could not be prepared
    #[error("file write error: {0}")]
    FileWriteError(String),

    /// Invalid scraper setup
    #[error("configuration error: {0}")]
    ConfigurationError(String),
}
