//! "Have your Say" response parser
//!
//! Stateless functions converting the platform's JSON documents into the
//! crate's typed records. Value normalisation happens here:
//! - categorical fields are lower-cased (`ENGLISH` → `english`)
//! - category labels are snake_cased (`EU citizen` → `eu_citizen`)
//! - `dateFeedback` is parsed, falling back to `None` when unparsable

use crate::fetcher::hys_config::{join_url, HYS_ENDPOINTS};
use crate::fetcher::{FeedbackPage, FetcherError, FetcherResult};
use crate::{AttachmentRef, Feedback, StatisticRecord, Submitter};
use chrono::{DateTime, NaiveDateTime};
use serde_json::{Map, Value};

/// Date formats the platform has been seen to use for `dateFeedback`
const DATE_FORMATS: &[&str] = &[
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Stateless parser for platform responses
pub struct HysParser;

impl HysParser {
    /// Parse one page of the `allFeedback` listing
    ///
    /// An empty listing omits `_embedded` entirely, which yields an empty
    /// page rather than an error. The `page` block is optional as well.
    ///
    /// # Arguments
    /// * `document` - Response body
    /// * `base_url` - Base URL used to build attachment download links
    pub fn parse_feedback_page(document: Value, base_url: &str) -> FetcherResult<FeedbackPage> {
        let mut root = into_object(document, "feedback listing")?;

        let feedback = match root.remove("_embedded") {
            None | Some(Value::Null) => Vec::new(),
            Some(embedded) => {
                let mut embedded = into_object(embedded, "_embedded")?;
                match embedded.remove("feedback") {
                    None | Some(Value::Null) => Vec::new(),
                    Some(Value::Array(items)) => items
                        .into_iter()
                        .map(|item| Self::parse_feedback(item, base_url))
                        .collect::<FetcherResult<Vec<_>>>()?,
                    Some(other) => {
                        return Err(FetcherError::InvalidResponse(format!(
                            "_embedded.feedback is not an array: {other}"
                        )))
                    }
                }
            }
        };

        let (size, total_pages, total_elements) = match root.get("page") {
            Some(Value::Object(page)) => (
                page.get("size").and_then(Value::as_u64).map(saturate_u32),
                page.get("totalPages").and_then(Value::as_u64).map(saturate_u32),
                page.get("totalElements").and_then(Value::as_u64),
            ),
            _ => (None, None, None),
        };

        Ok(FeedbackPage {
            feedback,
            size,
            total_pages,
            total_elements,
        })
    }

    /// Parse a single feedback object
    ///
    /// # Errors
    /// Returns `InvalidResponse` if the object has no numeric `id`.
    pub fn parse_feedback(item: Value, base_url: &str) -> FetcherResult<Feedback> {
        let object = into_object(item, "feedback")?;

        let id = object
            .get("id")
            .and_then(as_u64_lenient)
            .ok_or_else(|| FetcherError::InvalidResponse("feedback without numeric id".to_string()))?;

        let attachments = match object.get("attachments") {
            Some(Value::Array(items)) => items
                .iter()
                .map(|a| Self::parse_attachment(a, id, base_url))
                .collect::<FetcherResult<Vec<_>>>()?,
            _ => Vec::new(),
        };

        let submitter = Submitter {
            first_name: text(&object, "firstName"),
            surname: text(&object, "surname"),
            organization: text(&object, "organization"),
            user_type: lower(&object, "userType"),
            company_size: lower(&object, "companySize"),
            tr_number: text(&object, "trNumber"),
            governance_level: lower(&object, "governanceLevel"),
            scope: lower(&object, "scope"),
        };

        let feedback = Feedback {
            id,
            content: text(&object, "feedback").unwrap_or_default(),
            language: lower(&object, "language"),
            country: text(&object, "country"),
            date_feedback: text(&object, "dateFeedback").and_then(|d| parse_date(&d)),
            publication: lower(&object, "publication"),
            publication_status: lower(&object, "publicationStatus"),
            submitter,
            attachments,
        };
        feedback.validate().map_err(FetcherError::InvalidResponse)?;
        Ok(feedback)
    }

    fn parse_attachment(value: &Value, feedback_id: u64, base_url: &str) -> FetcherResult<AttachmentRef> {
        let document_id = value
            .get("documentId")
            .and_then(|v| match v {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .ok_or_else(|| {
                FetcherError::InvalidResponse(format!(
                    "attachment of feedback {feedback_id} has no documentId"
                ))
            })?;

        let file_name = ["fileName", "ersFileName"]
            .iter()
            .find_map(|key| value.get(*key).and_then(Value::as_str))
            .map(str::to_string);

        Ok(AttachmentRef {
            url: join_url(
                base_url,
                &format!("{}{}", HYS_ENDPOINTS.download_endpoint, document_id),
            ),
            id: document_id,
            feedback_id,
            file_name,
        })
    }

    /// Parse the `shortTitleByPublicationId` response
    pub fn parse_short_title(document: Value) -> FetcherResult<String> {
        document
            .get("shortTitle")
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| FetcherError::InvalidResponse("missing shortTitle".to_string()))
    }

    /// Parse the `feedBackByCountry` response
    ///
    /// Format: `{"feedbackCountryList": [{"label": "DEU", "total": 12}, ...]}`
    pub fn parse_country_statistics(document: Value) -> FetcherResult<Vec<StatisticRecord>> {
        let list = document
            .get("feedbackCountryList")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                FetcherError::InvalidResponse("missing feedbackCountryList array".to_string())
            })?;

        list.iter()
            .map(|entry| {
                let label = entry
                    .get("label")
                    .and_then(Value::as_str)
                    .ok_or_else(|| FetcherError::InvalidResponse("country entry without label".to_string()))?;
                let count = entry
                    .get("total")
                    .and_then(as_u64_lenient)
                    .ok_or_else(|| {
                        FetcherError::InvalidResponse(format!("country {label} without numeric total"))
                    })?;
                Ok(StatisticRecord {
                    label: label.to_string(),
                    count,
                })
            })
            .collect()
    }

    /// Parse the `feedbackByCategorOfRespondent` response
    ///
    /// Format: `{"BUSINESS_ASSOCIATION": 5, "EU_CITIZEN": 40, ...}`, kept in
    /// document order with snake_cased labels.
    pub fn parse_category_statistics(document: Value) -> FetcherResult<Vec<StatisticRecord>> {
        let object = into_object(document, "category statistics")?;

        object
            .into_iter()
            .map(|(label, count)| {
                let count = as_u64_lenient(&count).ok_or_else(|| {
                    FetcherError::InvalidResponse(format!("category {label} without numeric count"))
                })?;
                Ok(StatisticRecord {
                    label: snake_case(&label),
                    count,
                })
            })
            .collect()
    }
}

/// Snake case a label: spaces become underscores, camelCase humps are split,
/// everything is lower-cased
///
/// ```
/// use hys_scraper::fetcher::hys_parser::snake_case;
///
/// assert_eq!(snake_case("userType"), "user_type");
/// assert_eq!(snake_case("EU citizen"), "eu_citizen");
/// assert_eq!(snake_case("BUSINESS_ASSOCIATION"), "business_association");
/// ```
pub fn snake_case(line: &str) -> String {
    let mut out = String::with_capacity(line.len() + 4);
    let mut prev: Option<char> = None;

    for c in line.chars() {
        let c = if c == ' ' { '_' } else { c };
        if c.is_uppercase() && prev.is_some_and(|p| p.is_lowercase() || p.is_ascii_digit()) {
            out.push('_');
        }
        out.extend(c.to_lowercase());
        prev = Some(c);
    }

    out
}

/// Parse a `dateFeedback` value
pub fn parse_date(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.naive_utc()))
}

fn into_object(value: Value, what: &str) -> FetcherResult<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(FetcherError::InvalidResponse(format!(
            "{what} is not a JSON object: {}",
            truncate(&other.to_string(), 120)
        ))),
    }
}

fn text(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn lower(object: &Map<String, Value>, key: &str) -> Option<String> {
    text(object, key).map(|s| s.to_lowercase())
}

/// Counts and ids arrive as numbers, occasionally as numeric strings
fn as_u64_lenient(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn saturate_u32(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
