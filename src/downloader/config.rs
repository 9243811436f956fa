//! Scrape configuration

use crate::fetcher::hys_config::HYS_ENDPOINTS;
use std::time::Duration;

/// Default minimum time between two requests to the platform.
/// Large scrapes should raise this rather than lower it.
pub const DEFAULT_MIN_DELAY: Duration = Duration::from_secs(1);

/// Hard ceiling on page requests for a single listing.
pub const MAX_PAGE_REQUESTS: u32 = 10_000;

/// Flush interval for output writers (flush every N rows)
pub const FLUSH_INTERVAL: u64 = 1_000;

/// User-Agent sent with every request
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Settings for a [`Scraper`](super::Scraper) run
#[derive(Debug, Clone, PartialEq)]
pub struct ScraperConfig {
    /// Base URL of the better-regulation portal
    pub base_url: String,
    /// Feedback page size; `None` lets the platform choose
    pub page_size: Option<u32>,
    /// Minimum time between consecutive requests
    pub min_delay: Duration,
    /// Whether attachments are downloaded
    pub download_attachments: bool,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: HYS_ENDPOINTS.base_url.to_string(),
            page_size: None,
            min_delay: DEFAULT_MIN_DELAY,
            download_attachments: true,
        }
    }
}

impl ScraperConfig {
    /// Use a different base URL (mock servers, mirrors)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Request pages of a fixed size
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Change the minimum delay between requests
    pub fn with_min_delay(mut self, min_delay: Duration) -> Self {
        self.min_delay = min_delay;
        self
    }

    /// Skip attachment downloads
    pub fn without_attachments(mut self) -> Self {
        self.download_attachments = false;
        self
    }
}
