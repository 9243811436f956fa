//! Rate-limited HTTP client for the "Have your Say" platform
//!
//! Every request goes through the shared [`RateLimiter`]. There is no retry
//! logic: a transport error, a non-success status or a body that does not
//! deserialize is returned to the caller immediately.

use bytes::Bytes;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::downloader::config::USER_AGENT;
use crate::downloader::rate_limit::{RateLimiter, RequestPermit};
use crate::fetcher::hys_config::join_url;
use crate::fetcher::{FetcherError, FetcherResult};

/// HTTP client shared by all platform requests
#[derive(Debug, Clone)]
pub struct HysHttpClient {
    client: Arc<Client>,
    base_url: String,
    rate_limiter: RateLimiter,
}

impl HysHttpClient {
    /// Create a client around an existing reqwest client
    ///
    /// # Arguments
    /// * `client` - Shared HTTP client
    /// * `base_url` - Base URL the endpoint paths are joined to
    /// * `rate_limiter` - Limiter enforcing the delay between requests
    pub fn new(client: Arc<Client>, base_url: impl Into<String>, rate_limiter: RateLimiter) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            rate_limiter,
        }
    }

    /// Create a client with a fresh reqwest client carrying the crate's User-Agent
    pub fn with_defaults(base_url: impl Into<String>, rate_limiter: RateLimiter) -> FetcherResult<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetcherError::ClientError(e.to_string()))?;
        Ok(Self::new(Arc::new(client), base_url, rate_limiter))
    }

    /// Base URL endpoint paths are joined to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL of an endpoint path
    pub fn url(&self, endpoint: &str) -> String {
        join_url(&self.base_url, endpoint)
    }

    /// GET an endpoint and deserialize the JSON body
    ///
    /// # Errors
    /// `NetworkError` on transport failure, `HttpError` on a non-success
    /// status, `ParseError` when the body does not deserialize into `T`.
    pub async fn get_json<T>(&self, endpoint: &str, params: &[(&str, String)]) -> FetcherResult<T>
    where
        T: DeserializeOwned,
    {
        let url = self.url(endpoint);
        // Held until the body is read
        let _permit = self.rate_limiter.acquire().await;

        debug!("GET {} with {} params", url, params.len());
        let response = self.send(&url, params).await?;

        let body = response
            .bytes()
            .await
            .map_err(|e| FetcherError::NetworkError(format!("Failed to read body of {url}: {e}")))?;

        serde_json::from_slice(&body)
            .map_err(|e| FetcherError::ParseError(format!("Failed to deserialize response of {url}: {e}")))
    }

    /// GET an absolute URL and return the body as a chunked download
    ///
    /// The rate limiter slot is held until the returned [`Download`] is
    /// dropped, so the delay before the next request counts from the end of
    /// the body transfer.
    pub async fn get_download(&self, url: &str) -> FetcherResult<Download> {
        // Moved into the Download below
        let permit = self.rate_limiter.acquire().await;

        debug!("GET {} (download)", url);
        let response = self.send(url, &[]).await?;

        Ok(Download {
            url: url.to_string(),
            content_length: response.content_length(),
            response,
            _permit: permit,
        })
    }

    async fn send(&self, url: &str, params: &[(&str, String)]) -> FetcherResult<Response> {
        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| FetcherError::NetworkError(format!("Request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            warn!("{} returned status {}", url, status);
            return Err(FetcherError::HttpError {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response)
    }
}

/// A response body being downloaded
#[derive(Debug)]
pub struct Download {
    url: String,
    content_length: Option<u64>,
    response: Response,
    _permit: RequestPermit,
}

impl Download {
    /// Body size announced by the server, if any
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// Next chunk of the body, `None` once the body is complete
    pub async fn chunk(&mut self) -> FetcherResult<Option<Bytes>> {
        self.response
            .chunk()
            .await
            .map_err(|e| FetcherError::NetworkError(format!("Failed to read body of {}: {e}", self.url)))
    }
}
