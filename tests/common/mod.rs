//! Shared fixtures for tests against a mocked platform

#![allow(dead_code)]

use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub const PUBLICATION_ID: &str = "24212003";

/// A feedback object as the platform returns it
pub fn feedback_json(id: u64, document_ids: &[&str]) -> Value {
    let attachments: Vec<Value> = document_ids
        .iter()
        .enumerate()
        .map(|(i, doc)| {
            json!({
                "id": id * 100 + i as u64,
                "documentId": doc,
                "fileName": format!("{doc}.pdf"),
                "pages": 2,
                "size": 1024
            })
        })
        .collect();

    json!({
        "id": id,
        "feedback": format!("Feedback number {id}"),
        "language": "EN",
        "country": "BEL",
        "userType": "EU_CITIZEN",
        "firstName": "Ada",
        "surname": "Lovelace",
        "dateFeedback": "2021/08/06 23:35:02",
        "publicationStatus": "PUBLISHED",
        "isMyFeedback": false,
        "attachments": attachments
    })
}

/// A listing page; `total_pages` is omitted when `None`
pub fn page_json(items: Vec<Value>, size: u32, total_pages: Option<u32>) -> Value {
    let mut page = json!({"size": size, "number": 0});
    if let Some(total) = total_pages {
        page["totalPages"] = json!(total);
    }

    if items.is_empty() {
        json!({ "page": page })
    } else {
        json!({ "_embedded": { "feedback": items }, "page": page })
    }
}

/// Mount one listing page
pub async fn mount_page(server: &MockServer, page: u32, body: Value, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/brpapi/allFeedback"))
        .and(query_param("publicationId", PUBLICATION_ID))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(expected_calls)
        .mount(server)
        .await;
}

/// Mount a listing of `pages` pages with `per_page` records each, followed by
/// an empty page, without reporting totals
pub async fn mount_listing(server: &MockServer, pages: u32, per_page: u32, attachments_on: &[u64]) {
    let mut next_id = 1u64;
    for page in 0..pages {
        let items: Vec<Value> = (0..per_page)
            .map(|_| {
                let id = next_id;
                next_id += 1;
                if attachments_on.contains(&id) {
                    let doc = format!("doc{id}");
                    feedback_json(id, &[doc.as_str()])
                } else {
                    feedback_json(id, &[])
                }
            })
            .collect();
        mount_page(server, page, page_json(items, per_page, None), 1).await;
    }
    mount_page(server, pages, page_json(Vec::new(), per_page, None), 1).await;
}

/// Mount both statistics endpoints
pub async fn mount_statistics(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/brpapi/feedBackByCountry"))
        .and(query_param("publicationId", PUBLICATION_ID))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "feedbackCountryList": [
                {"label": "BEL", "total": 4},
                {"label": "DEU", "total": 2}
            ]
        })))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/brpapi/feedbackByCategorOfRespondent"))
        .and(query_param("publicationId", PUBLICATION_ID))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "EU_CITIZEN": 5,
            "BUSINESS_ASSOCIATION": 1
        })))
        .expect(1)
        .mount(server)
        .await;
}

/// Mount the short title endpoint
pub async fn mount_title(server: &MockServer, title: &str) {
    Mock::given(method("GET"))
        .and(path("/brpapi/shortTitleByPublicationId"))
        .and(query_param("publicationId", PUBLICATION_ID))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "shortTitle": title })))
        .mount(server)
        .await;
}

/// Mount one attachment download
pub async fn mount_attachment(server: &MockServer, document_id: &str, status: u16, body: &[u8], expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/api/download/{document_id}")))
        .respond_with(ResponseTemplate::new(status).set_body_bytes(body.to_vec()))
        .expect(expected_calls)
        .mount(server)
        .await;
}

/// Responder recording the arrival time of every request
#[derive(Clone)]
pub struct TimestampResponder {
    pub arrivals: Arc<Mutex<Vec<Instant>>>,
    pub status: u16,
    pub body: Value,
}

impl TimestampResponder {
    pub fn new(status: u16, body: Value) -> Self {
        Self {
            arrivals: Arc::new(Mutex::new(Vec::new())),
            status,
            body,
        }
    }

    pub fn arrivals(&self) -> Vec<Instant> {
        self.arrivals.lock().unwrap().clone()
    }
}

impl Respond for TimestampResponder {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        self.arrivals.lock().unwrap().push(Instant::now());
        ResponseTemplate::new(self.status).set_body_json(self.body.clone())
    }
}
