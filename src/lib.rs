//! # Have your Say Scraper Library
//!
//! Downloads public feedback submissions, their attachments, and aggregate
//! statistics for a single initiative of the European Commission's
//! "Have your Say" platform.
//!
//! ## Quick Start
//!
//! ```no_run
//! use hys_scraper::downloader::{Scraper, ScraperConfig};
//! use hys_scraper::identifier::PublicationId;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let id = PublicationId::parse("24212003")?;
//! let config = ScraperConfig::default().without_attachments();
//!
//! let scraper = Scraper::new(id, config)?;
//! let result = scraper.scrape().await?;
//! println!("{} feedback submissions", result.feedback.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`identifier`] - Publication id parsing and validation
//! - [`fetcher`] - Rate-limited HTTP access, response parsing and pagination
//! - [`downloader`] - Attachment downloads and scrape orchestration
//! - [`output`] - Output folder layout and CSV writers
//! - [`cli`] - Command line surface
//!
//! ## Data Types
//!
//! - [`Feedback`] - A single public submission with its submitter metadata
//! - [`AttachmentRef`] - A file referenced by a submission
//! - [`StatisticRecord`] - A label/count pair from the aggregate endpoints

#![warn(missing_docs)]
#![warn(clippy::all)]

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// CLI command implementations
pub mod cli;

/// Attachment downloads and scrape orchestration
pub mod downloader;

/// HTTP access to the platform
pub mod fetcher;

/// Publication id parsing and validation
pub mod identifier;

/// Output layout and writers
pub mod output;

pub use identifier::PublicationId;

/// Who submitted a piece of feedback
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Submitter {
    /// First name, when published
    pub first_name: Option<String>,
    /// Surname, when published
    pub surname: Option<String>,
    /// Organization name
    pub organization: Option<String>,
    /// Category of respondent, lower-cased (e.g. "eu_citizen")
    pub user_type: Option<String>,
    /// Company size, lower-cased (e.g. "micro")
    pub company_size: Option<String>,
    /// EU transparency register number
    pub tr_number: Option<String>,
    /// Governance level of public authorities, lower-cased
    pub governance_level: Option<String>,
    /// Scope of the organization, lower-cased
    pub scope: Option<String>,
}

/// A single public feedback submission
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Feedback {
    /// Platform feedback id
    pub id: u64,
    /// Free-text content
    pub content: String,
    /// Submission language, lower-cased
    pub language: Option<String>,
    /// Three-letter country code of the submitter
    pub country: Option<String>,
    /// Submission date, if the platform value could be parsed
    pub date_feedback: Option<NaiveDateTime>,
    /// Publication name the feedback belongs to, lower-cased
    pub publication: Option<String>,
    /// Publication status, lower-cased
    pub publication_status: Option<String>,
    /// Submitter metadata
    pub submitter: Submitter,
    /// Attached files
    pub attachments: Vec<AttachmentRef>,
}

impl Feedback {
    /// Validate feedback integrity
    pub fn validate(&self) -> Result<(), String> {
        if let Some(attachment) = self.attachments.iter().find(|a| a.feedback_id != self.id) {
            return Err(format!(
                "Attachment {} references feedback {} but belongs to {}",
                attachment.id, attachment.feedback_id, self.id
            ));
        }
        Ok(())
    }
}

/// A file attached to a feedback submission
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct AttachmentRef {
    /// Platform document id
    pub id: String,
    /// Download URL
    pub url: String,
    /// Id of the feedback the file was submitted with
    pub feedback_id: u64,
    /// Original file name, when the platform reports one
    pub file_name: Option<String>,
}

impl AttachmentRef {
    /// Name of the downloaded file: `<id>.<ext>`
    ///
    /// The extension is taken from the original file name and defaults to `pdf`.
    pub fn local_file_name(&self) -> String {
        let ext = self
            .file_name
            .as_deref()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.trim().to_lowercase())
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or_else(|| "pdf".to_string());
        let stem: String = self
            .id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        format!("{stem}.{ext}")
    }
}

/// A label and count from one of the aggregate statistics endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatisticRecord {
    /// Country code or category of respondent
    pub label: String,
    /// Number of submissions
    pub count: u64,
}
