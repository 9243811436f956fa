//! Full scrapes against a mocked platform

use crate::common::*;
use hys_scraper::downloader::{AttachmentOutcome, ScrapeError, ScrapePhase, Scraper, ScraperConfig};
use hys_scraper::fetcher::FetcherError;
use hys_scraper::output::{self, OutputLayout};
use hys_scraper::PublicationId;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer) -> ScraperConfig {
    ScraperConfig::default()
        .with_base_url(server.uri())
        .with_min_delay(Duration::ZERO)
        .with_page_size(2)
}

fn publication_id() -> PublicationId {
    PublicationId::parse(PUBLICATION_ID).unwrap()
}

fn read_csv(path: &std::path::Path) -> Vec<Vec<String>> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let mut rows = vec![reader.headers().unwrap().iter().map(String::from).collect()];
    for record in reader.records() {
        rows.push(record.unwrap().iter().map(String::from).collect());
    }
    rows
}

#[tokio::test]
async fn test_failed_attachment_does_not_stop_the_others() {
    let server = MockServer::start().await;
    mount_listing(&server, 2, 2, &[1, 2, 4]).await;
    mount_statistics(&server).await;
    mount_attachment(&server, "doc1", 200, b"first", 1).await;
    mount_attachment(&server, "doc2", 500, b"", 1).await;
    mount_attachment(&server, "doc4", 200, b"fourth payload", 1).await;

    let dir = TempDir::new().unwrap();
    let attachments_dir = dir.path().join("attachments");
    let scraper = Scraper::new(publication_id(), config(&server))
        .unwrap()
        .with_attachments_dir(&attachments_dir);

    let result = scraper.scrape().await.unwrap();

    assert_eq!(result.feedback.len(), 4);
    assert_eq!(result.attachments.len(), 3);
    assert_eq!(result.attachments[0].outcome, AttachmentOutcome::Downloaded { bytes: 5 });
    assert!(matches!(result.attachments[1].outcome, AttachmentOutcome::Failed(_)));
    assert_eq!(result.attachments[2].outcome, AttachmentOutcome::Downloaded { bytes: 14 });
    assert_eq!(result.failed_attachments().count(), 1);

    assert_eq!(std::fs::read(attachments_dir.join("doc1.pdf")).unwrap(), b"first");
    assert_eq!(std::fs::read(attachments_dir.join("doc4.pdf")).unwrap(), b"fourth payload");
    assert!(!attachments_dir.join("doc2.pdf").exists());

    // every reference has either a file or a recorded failure
    for record in &result.attachments {
        let on_disk = attachments_dir.join(record.attachment.local_file_name()).exists();
        assert!(on_disk || matches!(record.outcome, AttachmentOutcome::Failed(_)));
        assert_eq!(on_disk, record.outcome.has_file());
    }

    // no temporary files left behind
    let leftovers: Vec<_> = std::fs::read_dir(&attachments_dir)
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().ends_with(".part"))
        .collect();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn test_existing_attachments_are_skipped() {
    let server = MockServer::start().await;
    mount_listing(&server, 1, 2, &[1, 2]).await;
    mount_statistics(&server).await;
    mount_attachment(&server, "doc1", 200, b"new", 0).await;
    mount_attachment(&server, "doc2", 200, b"second", 1).await;

    let dir = TempDir::new().unwrap();
    let attachments_dir = dir.path().join("attachments");
    std::fs::create_dir_all(&attachments_dir).unwrap();
    std::fs::write(attachments_dir.join("doc1.pdf"), b"old").unwrap();

    let scraper = Scraper::new(publication_id(), config(&server))
        .unwrap()
        .with_attachments_dir(&attachments_dir);
    let result = scraper.scrape().await.unwrap();

    assert_eq!(result.attachments[0].outcome, AttachmentOutcome::AlreadyPresent);
    assert_eq!(result.attachments[1].outcome, AttachmentOutcome::Downloaded { bytes: 6 });
    assert_eq!(std::fs::read(attachments_dir.join("doc1.pdf")).unwrap(), b"old");
}

#[tokio::test]
async fn test_without_attachments_only_indexes_references() {
    let server = MockServer::start().await;
    mount_listing(&server, 1, 2, &[2]).await;
    mount_statistics(&server).await;
    mount_attachment(&server, "doc2", 200, b"never", 0).await;

    let dir = TempDir::new().unwrap();
    let layout = OutputLayout::new(dir.path().join("out"));
    output::ensure_dir(layout.root()).unwrap();

    let scraper = Scraper::new(publication_id(), config(&server).without_attachments()).unwrap();
    let result = scraper.scrape().await.unwrap();
    output::write_scrape_result(&layout, &result).unwrap();

    assert!(!layout.attachments_dir().exists());
    assert_eq!(result.attachments.len(), 1);
    assert_eq!(result.attachments[0].outcome, AttachmentOutcome::NotRequested);

    let rows = read_csv(&layout.attachments_csv());
    assert_eq!(rows[0], vec!["id", "attachment_id", "filename", "status", "error", "url"]);
    assert_eq!(rows[1][0], "2");
    assert_eq!(rows[1][1], "doc2");
    assert_eq!(rows[1][2], "attachments/doc2.pdf");
    assert_eq!(rows[1][3], "not_requested");
    assert_eq!(rows[1][5], format!("{}/api/download/doc2", server.uri()));
}

#[tokio::test]
async fn test_statistics_and_feedback_tables() {
    let server = MockServer::start().await;
    mount_listing(&server, 1, 2, &[]).await;
    mount_statistics(&server).await;

    let dir = TempDir::new().unwrap();
    let layout = OutputLayout::new(dir.path());

    let scraper = Scraper::new(publication_id(), config(&server).without_attachments()).unwrap();
    let result = scraper.scrape().await.unwrap();
    output::write_scrape_result(&layout, &result).unwrap();

    let countries = read_csv(&layout.countries_csv());
    assert_eq!(
        countries,
        vec![
            vec!["country".to_string(), "n_responses".to_string()],
            vec!["BEL".to_string(), "4".to_string()],
            vec!["DEU".to_string(), "2".to_string()],
        ]
    );

    let categories = read_csv(&layout.categories_csv());
    assert_eq!(categories[1], vec!["eu_citizen", "5"]);
    assert_eq!(categories[2], vec!["business_association", "1"]);

    let feedbacks = read_csv(&layout.feedbacks_csv());
    assert_eq!(feedbacks.len(), 3);
    assert_eq!(feedbacks[0][0], "id");
    assert_eq!(feedbacks[1][0], "1");
    assert_eq!(feedbacks[2][0], "2");
    let user_type = feedbacks[0].iter().position(|h| h == "user_type").unwrap();
    assert_eq!(feedbacks[1][user_type], "eu_citizen");
    let content = feedbacks[0].iter().position(|h| h == "feedback").unwrap();
    assert_eq!(feedbacks[1][content], "Feedback number 1");

    // no attachments: the index only has its header
    let attachments = read_csv(&layout.attachments_csv());
    assert_eq!(attachments.len(), 1);
}

#[tokio::test]
async fn test_listing_failure_aborts_before_statistics() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/brpapi/allFeedback"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/brpapi/feedBackByCountry"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let scraper = Scraper::new(publication_id(), config(&server).without_attachments()).unwrap();
    let result = scraper.scrape().await;

    match result {
        Err(ScrapeError::RequestError {
            phase: ScrapePhase::FetchingFeedback,
            source: FetcherError::HttpError { status: 502, .. },
        }) => {}
        other => panic!("expected a feedback request error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_statistics_failure_is_reported_with_phase() {
    let server = MockServer::start().await;
    mount_listing(&server, 1, 1, &[]).await;
    Mock::given(method("GET"))
        .and(path("/brpapi/feedBackByCountry"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let scraper = Scraper::new(publication_id(), config(&server).without_attachments()).unwrap();
    let result = scraper.scrape().await;

    assert!(matches!(
        result,
        Err(ScrapeError::RequestError {
            phase: ScrapePhase::FetchingStatistics,
            ..
        })
    ));
}
