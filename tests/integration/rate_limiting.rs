//! Spacing between consecutive requests

use crate::common::*;
use hys_scraper::downloader::{AttachmentDownloader, AttachmentOutcome, RateLimiter};
use hys_scraper::fetcher::{HysApiClient, HysHttpClient, Paginator};
use hys_scraper::{AttachmentRef, PublicationId};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer};

const DELAY: Duration = Duration::from_millis(150);

fn limited_client(server: &MockServer, delay: Duration) -> HysApiClient {
    let http = HysHttpClient::with_defaults(server.uri(), RateLimiter::min_delay(delay)).unwrap();
    HysApiClient::new(http, PublicationId::parse(PUBLICATION_ID).unwrap())
}

fn assert_spaced(responder: &TimestampResponder, expected_requests: usize, delay: Duration) {
    let arrivals = responder.arrivals();
    assert_eq!(arrivals.len(), expected_requests);
    for pair in arrivals.windows(2) {
        let gap = pair[1].duration_since(pair[0]);
        assert!(gap >= delay, "requests only {gap:?} apart, expected at least {delay:?}");
    }
}

#[tokio::test]
async fn test_listing_requests_are_spaced() {
    let server = MockServer::start().await;
    let responder = TimestampResponder::new(
        200,
        json!({ "_embedded": { "feedback": [feedback_json(1, &[])] } }),
    );
    Mock::given(method("GET"))
        .and(path("/brpapi/allFeedback"))
        .respond_with(responder.clone())
        .mount(&server)
        .await;

    let api = limited_client(&server, DELAY);
    let result = Paginator::new(&api, Some(1)).with_max_requests(4).collect_all().await;

    assert!(result.is_err());
    assert_spaced(&responder, 4, DELAY);
}

#[tokio::test]
async fn test_failed_requests_still_count() {
    let server = MockServer::start().await;
    let responder = TimestampResponder::new(500, json!({}));
    Mock::given(method("GET"))
        .and(path("/brpapi/feedBackByCountry"))
        .respond_with(responder.clone())
        .mount(&server)
        .await;

    let api = limited_client(&server, DELAY);
    for _ in 0..3 {
        assert!(api.fetch_country_statistics().await.is_err());
    }

    assert_spaced(&responder, 3, DELAY);
}

#[tokio::test]
async fn test_mixed_endpoints_share_one_limiter() {
    let server = MockServer::start().await;
    let responder = TimestampResponder::new(
        200,
        json!({
            "shortTitle": "Some initiative",
            "feedbackCountryList": [{"label": "FRA", "total": 1}]
        }),
    );
    Mock::given(method("GET"))
        .respond_with(responder.clone())
        .mount(&server)
        .await;

    let api = limited_client(&server, DELAY);
    api.fetch_short_title().await.unwrap();
    api.fetch_country_statistics().await.unwrap();
    api.fetch_short_title().await.unwrap();

    assert_spaced(&responder, 3, DELAY);
}

#[tokio::test]
async fn test_downloads_are_spaced_like_other_requests() {
    let server = MockServer::start().await;
    let responder = TimestampResponder::new(200, json!({ "shortTitle": "Some initiative" }));
    Mock::given(method("GET"))
        .respond_with(responder.clone())
        .mount(&server)
        .await;

    let references: Vec<AttachmentRef> = ["d1", "d2", "d3"]
        .iter()
        .map(|id| AttachmentRef {
            id: id.to_string(),
            url: format!("{}/api/download/{id}", server.uri()),
            feedback_id: 1,
            file_name: None,
        })
        .collect();

    let dir = tempfile::TempDir::new().unwrap();
    let api = limited_client(&server, DELAY);

    api.fetch_short_title().await.unwrap();
    let records = AttachmentDownloader::new(&api, dir.path())
        .download_all(&references)
        .await;
    api.fetch_short_title().await.unwrap();

    assert!(records
        .iter()
        .all(|r| matches!(r.outcome, AttachmentOutcome::Downloaded { .. })));
    assert_spaced(&responder, 5, DELAY);
}

#[tokio::test]
async fn test_zero_delay_does_not_wait() {
    let server = MockServer::start().await;
    let responder = TimestampResponder::new(200, json!({ "shortTitle": "Quick" }));
    Mock::given(method("GET"))
        .and(path("/brpapi/shortTitleByPublicationId"))
        .respond_with(responder.clone())
        .mount(&server)
        .await;

    let api = limited_client(&server, Duration::ZERO);
    let started = std::time::Instant::now();
    for _ in 0..5 {
        api.fetch_short_title().await.unwrap();
    }

    assert_eq!(responder.arrivals().len(), 5);
    assert!(started.elapsed() < Duration::from_secs(2));
}
