//! Data fetchers for the "Have your Say" platform

use crate::Feedback;
use async_trait::async_trait;
use futures_util::Stream;
use std::pin::Pin;

pub mod hys_api;
pub mod hys_config;
pub mod hys_http;
pub mod hys_parser;
pub mod pagination;

pub use hys_api::HysApiClient;
pub use hys_http::HysHttpClient;
pub use pagination::Paginator;

/// Fetcher errors
///
/// Every variant is a request failure in the sense that the remote could not
/// deliver what was asked for. None of them are retried.
#[derive(Debug, thiserror::Error)]
pub enum FetcherError {
    /// Non-success HTTP status
    #[error("HTTP error: {url} returned status {status}")]
    HttpError {
        /// Requested URL
        url: String,
        /// Status code returned by the platform
        status: u16,
    },

    /// Transport failure (DNS, connection, body read)
    #[error("network error: {0}")]
    NetworkError(String),

    /// Body was not valid JSON or did not match the expected type
    #[error("parse error: {0}")]
    ParseError(String),

    /// Well-formed JSON with an unexpected shape
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Listing kept reporting more pages past the safety ceiling
    #[error("pagination aborted after {0} page requests")]
    TooManyPages(u32),

    /// Client construction failure
    #[error("client error: {0}")]
    ClientError(String),
}

/// Result type for fetcher operations
pub type FetcherResult<T> = Result<T, FetcherError>;

/// Lazily paginated stream of feedback submissions
pub type FeedbackStream<'a> = Pin<Box<dyn Stream<Item = FetcherResult<Feedback>> + Send + 'a>>;

/// One page of the feedback listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbackPage {
    /// Submissions on this page, in platform order
    pub feedback: Vec<Feedback>,
    /// Page size the platform applied, when reported
    pub size: Option<u32>,
    /// Total number of pages, when reported
    pub total_pages: Option<u32>,
    /// Total number of submissions, when reported
    pub total_elements: Option<u64>,
}

/// Source of feedback listing pages
///
/// Implemented by [`HysApiClient`] against the live platform. The paginator
/// only depends on this trait, so alternative sources can be plugged in.
#[async_trait]
pub trait FeedbackSource: Send + Sync {
    /// Fetch one zero-indexed page of the listing
    ///
    /// # Arguments
    /// * `page` - Zero-based page index
    /// * `size` - Requested page size, `None` for the platform default
    async fn fetch_feedback_page(&self, page: u32, size: Option<u32>) -> FetcherResult<FeedbackPage>;
}
