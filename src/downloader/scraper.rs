//! Scrape orchestration

use indicatif::ProgressBar;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

use super::attachments::{AttachmentDownloader, AttachmentRecord};
use super::config::ScraperConfig;
use super::rate_limit::RateLimiter;
use super::ScrapeError;
use crate::fetcher::{FetcherError, FetcherResult, HysApiClient, HysHttpClient, Paginator};
use crate::identifier::PublicationId;
use crate::{AttachmentRef, Feedback, StatisticRecord};

/// Where a scrape currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapePhase {
    /// Walking the feedback listing
    FetchingFeedback,
    /// Fetching country and category counts
    FetchingStatistics,
    /// Downloading attachments
    DownloadingAttachments,
    /// All steps complete
    Done,
}

impl fmt::Display for ScrapePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::FetchingFeedback => "fetching feedback",
            Self::FetchingStatistics => "fetching statistics",
            Self::DownloadingAttachments => "downloading attachments",
            Self::Done => "done",
        };
        f.write_str(s)
    }
}

/// Everything a scrape produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapeResult {
    /// Feedback submissions in listing order
    pub feedback: Vec<Feedback>,
    /// Submissions per country
    pub countries: Vec<StatisticRecord>,
    /// Submissions per category of respondent
    pub categories: Vec<StatisticRecord>,
    /// One record per attachment reference, in feedback order
    pub attachments: Vec<AttachmentRecord>,
}

impl ScrapeResult {
    /// Attachments whose download failed
    pub fn failed_attachments(&self) -> impl Iterator<Item = &AttachmentRecord> {
        self.attachments
            .iter()
            .filter(|r| matches!(r.outcome, super::AttachmentOutcome::Failed(_)))
    }
}

/// All attachment references of `feedback`, in order
pub fn attachment_refs(feedback: &[Feedback]) -> Vec<AttachmentRef> {
    feedback
        .iter()
        .flat_map(|f| f.attachments.iter().cloned())
        .collect()
}

/// Scraper for one initiative
pub struct Scraper {
    api: HysApiClient,
    config: ScraperConfig,
    attachments_dir: Option<PathBuf>,
    progress: ProgressBar,
}

impl Scraper {
    /// Create a scraper for `publication_id`
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(publication_id: PublicationId, config: ScraperConfig) -> Result<Self, ScrapeError> {
        let rate_limiter = RateLimiter::min_delay(config.min_delay);
        let http_client = HysHttpClient::with_defaults(config.base_url.clone(), rate_limiter)
            .map_err(|e| ScrapeError::ConfigurationError(e.to_string()))?;

        Ok(Self {
            api: HysApiClient::new(http_client, publication_id),
            config,
            attachments_dir: None,
            progress: ProgressBar::hidden(),
        })
    }

    /// Folder attachments are downloaded into
    ///
    /// Required when the configuration enables attachment downloads. The
    /// folder is created on demand.
    pub fn with_attachments_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.attachments_dir = Some(dir.into());
        self
    }

    /// Report attachment download progress on `progress`
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Fetch the initiative's short title
    pub async fn publication_title(&self) -> FetcherResult<String> {
        self.api.fetch_short_title().await
    }

    /// Fetch all feedback submissions
    pub async fn scrape_feedback(&self) -> FetcherResult<Vec<Feedback>> {
        Paginator::new(&self.api, self.config.page_size)
            .collect_all()
            .await
    }

    /// Fetch per-country and per-category statistics
    pub async fn scrape_statistics(&self) -> FetcherResult<(Vec<StatisticRecord>, Vec<StatisticRecord>)> {
        let countries = self.api.fetch_country_statistics().await?;
        let categories = self.api.fetch_category_statistics().await?;
        Ok((countries, categories))
    }

    /// Run the full scrape
    ///
    /// # Errors
    /// Fails if a listing or statistics request fails, or if the attachments
    /// folder cannot be created. Individual attachment failures are recorded
    /// in the result instead.
    pub async fn scrape(&self) -> Result<ScrapeResult, ScrapeError> {
        // Fail on a bad setup before any request goes out
        let attachments_dir = self.resolve_attachments_dir()?;

        self.enter(ScrapePhase::FetchingFeedback);
        let feedback = self
            .scrape_feedback()
            .await
            .map_err(|e| fail(ScrapePhase::FetchingFeedback, e))?;
        info!("Fetched {} feedback submissions", feedback.len());

        self.enter(ScrapePhase::FetchingStatistics);
        let (countries, categories) = self
            .scrape_statistics()
            .await
            .map_err(|e| fail(ScrapePhase::FetchingStatistics, e))?;
        info!(
            "Fetched statistics for {} countries and {} categories",
            countries.len(),
            categories.len()
        );

        let references = attachment_refs(&feedback);
        let attachments = match attachments_dir {
            Some(dir) => {
                self.enter(ScrapePhase::DownloadingAttachments);
                tokio::fs::create_dir_all(dir).await.map_err(|e| {
                    ScrapeError::FileWriteError(format!("Failed to create {}: {e}", dir.display()))
                })?;
                AttachmentDownloader::new(&self.api, dir)
                    .with_progress(self.progress.clone())
                    .download_all(&references)
                    .await
            }
            None => {
                info!("Attachment downloads disabled, indexing {} references", references.len());
                references.iter().map(AttachmentRecord::not_requested).collect()
            }
        };

        self.enter(ScrapePhase::Done);
        Ok(ScrapeResult {
            feedback,
            countries,
            categories,
            attachments,
        })
    }

    fn resolve_attachments_dir(&self) -> Result<Option<&Path>, ScrapeError> {
        if !self.config.download_attachments {
            return Ok(None);
        }
        self.attachments_dir
            .as_deref()
            .map(Some)
            .ok_or_else(|| {
                ScrapeError::ConfigurationError(
                    "attachment downloads enabled but no attachments folder set".to_string(),
                )
            })
    }

    fn enter(&self, phase: ScrapePhase) {
        info!(publication_id = %self.api.publication_id(), "Scrape phase: {}", phase);
    }
}

fn fail(phase: ScrapePhase, source: FetcherError) -> ScrapeError {
    ScrapeError::RequestError { phase, source }
}
