//! Endpoint-level client for the "Have your Say" platform

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::fetcher::hys_config::HYS_ENDPOINTS;
use crate::fetcher::hys_http::{Download, HysHttpClient};
use crate::fetcher::hys_parser::HysParser;
use crate::fetcher::{FeedbackPage, FeedbackSource, FetcherResult};
use crate::identifier::PublicationId;
use crate::{AttachmentRef, StatisticRecord};

/// Client for one initiative's endpoints
#[derive(Debug, Clone)]
pub struct HysApiClient {
    http_client: HysHttpClient,
    publication_id: PublicationId,
}

impl HysApiClient {
    /// Create a client for `publication_id`
    pub fn new(http_client: HysHttpClient, publication_id: PublicationId) -> Self {
        Self {
            http_client,
            publication_id,
        }
    }

    /// Publication this client is bound to
    pub fn publication_id(&self) -> &PublicationId {
        &self.publication_id
    }

    fn publication_param(&self) -> (&'static str, String) {
        ("publicationId", self.publication_id.to_string())
    }

    /// Fetch the initiative's short title (e.g. "Requirements for Artificial Intelligence")
    pub async fn fetch_short_title(&self) -> FetcherResult<String> {
        let document: Value = self
            .http_client
            .get_json(HYS_ENDPOINTS.short_title_endpoint, &[self.publication_param()])
            .await?;
        HysParser::parse_short_title(document)
    }

    /// Fetch feedback counts per country
    pub async fn fetch_country_statistics(&self) -> FetcherResult<Vec<StatisticRecord>> {
        let document: Value = self
            .http_client
            .get_json(HYS_ENDPOINTS.by_country_endpoint, &[self.publication_param()])
            .await?;
        let stats = HysParser::parse_country_statistics(document)?;
        debug!("Fetched {} country statistics", stats.len());
        Ok(stats)
    }

    /// Fetch feedback counts per category of respondent
    pub async fn fetch_category_statistics(&self) -> FetcherResult<Vec<StatisticRecord>> {
        let document: Value = self
            .http_client
            .get_json(HYS_ENDPOINTS.by_category_endpoint, &[self.publication_param()])
            .await?;
        let stats = HysParser::parse_category_statistics(document)?;
        debug!("Fetched {} category statistics", stats.len());
        Ok(stats)
    }

    /// Start downloading an attachment's payload
    pub async fn download_attachment(&self, attachment: &AttachmentRef) -> FetcherResult<Download> {
        self.http_client.get_download(&attachment.url).await
    }
}

#[async_trait]
impl FeedbackSource for HysApiClient {
    async fn fetch_feedback_page(&self, page: u32, size: Option<u32>) -> FetcherResult<FeedbackPage> {
        let mut params = vec![self.publication_param(), ("page", page.to_string())];
        if let Some(size) = size {
            params.push(("size", size.to_string()));
        }

        let document: Value = self
            .http_client
            .get_json(HYS_ENDPOINTS.feedback_endpoint, &params)
            .await?;

        let parsed = HysParser::parse_feedback_page(document, self.http_client.base_url())?;
        debug!(
            "Fetched feedback page {} with {} submissions",
            page,
            parsed.feedback.len()
        );
        Ok(parsed)
    }
}
