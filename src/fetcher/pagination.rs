//! Feedback listing pagination
//!
//! Pages are requested with a zero-based `page` index. The walk stops when:
//! - the platform reported `totalPages` and the next index reaches it
//! - a page comes back empty
//! - a request fails (the error is surfaced, never skipped)
//!
//! A ceiling on the number of requests guards against a listing that never
//! ends.

use crate::downloader::config::MAX_PAGE_REQUESTS;
use crate::fetcher::{FeedbackSource, FeedbackStream, FetcherError, FetcherResult};
use crate::Feedback;
use futures_util::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info};

/// Sequential walker over a feedback listing
pub struct Paginator<'a, S: FeedbackSource + ?Sized> {
    source: &'a S,
    page_size: Option<u32>,
    max_requests: u32,
    next_index: u32,
    total_pages: Option<u32>,
    requests: u32,
    finished: bool,
}

impl<'a, S: FeedbackSource + ?Sized> Paginator<'a, S> {
    /// Create a paginator over `source`
    ///
    /// # Arguments
    /// * `source` - Listing to walk
    /// * `page_size` - Requested page size; `None` adopts the size the
    ///   platform reports on the first page
    pub fn new(source: &'a S, page_size: Option<u32>) -> Self {
        Self {
            source,
            page_size,
            max_requests: MAX_PAGE_REQUESTS,
            next_index: 0,
            total_pages: None,
            requests: 0,
            finished: false,
        }
    }

    /// Override the request ceiling
    pub fn with_max_requests(mut self, max_requests: u32) -> Self {
        self.max_requests = max_requests;
        self
    }

    /// Number of page requests issued so far
    pub fn requests_made(&self) -> u32 {
        self.requests
    }

    /// Whether the listing is exhausted
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Fetch the next non-empty page
    ///
    /// Returns `Ok(None)` once the listing is exhausted. After an error the
    /// paginator is finished and keeps returning `Ok(None)`.
    pub async fn next_page(&mut self) -> FetcherResult<Option<Vec<Feedback>>> {
        if self.finished {
            return Ok(None);
        }

        if let Some(total) = self.total_pages {
            if self.next_index >= total {
                debug!(
                    "Pagination complete: reached totalPages={} after {} requests",
                    total, self.requests
                );
                self.finished = true;
                return Ok(None);
            }
        }

        if self.requests >= self.max_requests {
            self.finished = true;
            return Err(FetcherError::TooManyPages(self.requests));
        }

        debug!(
            "Fetching feedback page {} (size {:?})",
            self.next_index, self.page_size
        );

        let page = match self.source.fetch_feedback_page(self.next_index, self.page_size).await {
            Ok(page) => page,
            Err(e) => {
                self.finished = true;
                return Err(e);
            }
        };
        self.requests += 1;

        // Later pages must use the same size or the offsets drift.
        if self.page_size.is_none() {
            self.page_size = page.size;
        }
        if page.total_pages.is_some() {
            self.total_pages = page.total_pages;
        }
        if let (0, Some(total)) = (self.next_index, page.total_elements) {
            info!("Listing reports {} feedback submissions", total);
        }

        if page.feedback.is_empty() {
            debug!(
                "Empty page received at index {}. Pagination complete after {} requests",
                self.next_index, self.requests
            );
            self.finished = true;
            return Ok(None);
        }

        debug!(
            "Received {} submissions in page {}",
            page.feedback.len(),
            self.next_index
        );
        self.next_index += 1;
        Ok(Some(page.feedback))
    }

    /// Turn the paginator into a lazy stream of submissions
    ///
    /// A page is only requested once the previous one has been consumed. An
    /// error is yielded as the last item.
    pub fn into_stream(self) -> FeedbackStream<'a> {
        let stream = stream::unfold(self, |mut paginator| async move {
            match paginator.next_page().await {
                Ok(Some(items)) => {
                    let items: Vec<FetcherResult<Feedback>> = items.into_iter().map(Ok).collect();
                    Some((stream::iter(items), paginator))
                }
                Ok(None) => None,
                Err(e) => Some((stream::iter(vec![Err(e)]), paginator)),
            }
        })
        .flatten();

        Box::pin(stream)
    }

    /// Drain the whole listing into memory, failing on the first error
    pub async fn collect_all(self) -> FetcherResult<Vec<Feedback>> {
        self.into_stream().try_collect().await
    }
}
