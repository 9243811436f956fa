//! CSV output writers
//!
//! One file per table:
//! - `feedbacks.csv` - one row per submission, attachments as a count
//! - `countries.csv` / `categories.csv` - label and number of responses
//! - `attachments.csv` - attachment id to file name, with the download outcome

use crate::downloader::config::FLUSH_INTERVAL;
use crate::downloader::{AttachmentRecord, ScrapeResult};
use crate::{Feedback, StatisticRecord};
use csv::Writer;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::marker::PhantomData;
use std::path::Path;
use tracing::{debug, info};

use super::{OutputError, OutputLayout, OutputResult, OutputWriter, TableWriter};

const DEFAULT_BUFFER_SIZE: usize = 8192; // 8KB buffer

/// Date format used for `date_feedback`
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// CSV record for a feedback submission
#[derive(Debug, Serialize)]
pub struct FeedbackRow<'a> {
    id: u64,
    date_feedback: Option<String>,
    language: Option<&'a str>,
    country: Option<&'a str>,
    user_type: Option<&'a str>,
    organization: Option<&'a str>,
    first_name: Option<&'a str>,
    surname: Option<&'a str>,
    company_size: Option<&'a str>,
    tr_number: Option<&'a str>,
    governance_level: Option<&'a str>,
    scope: Option<&'a str>,
    publication: Option<&'a str>,
    publication_status: Option<&'a str>,
    n_attachments: usize,
    feedback: &'a str,
}

impl<'a> From<&'a Feedback> for FeedbackRow<'a> {
    fn from(f: &'a Feedback) -> Self {
        Self {
            id: f.id,
            date_feedback: f.date_feedback.map(|d| d.format(DATE_FORMAT).to_string()),
            language: f.language.as_deref(),
            country: f.country.as_deref(),
            user_type: f.submitter.user_type.as_deref(),
            organization: f.submitter.organization.as_deref(),
            first_name: f.submitter.first_name.as_deref(),
            surname: f.submitter.surname.as_deref(),
            company_size: f.submitter.company_size.as_deref(),
            tr_number: f.submitter.tr_number.as_deref(),
            governance_level: f.submitter.governance_level.as_deref(),
            scope: f.submitter.scope.as_deref(),
            publication: f.publication.as_deref(),
            publication_status: f.publication_status.as_deref(),
            n_attachments: f.attachments.len(),
            feedback: &f.content,
        }
    }
}

/// CSV record for a per-country count
#[derive(Debug, Serialize)]
pub struct CountryRow<'a> {
    country: &'a str,
    n_responses: u64,
}

impl<'a> From<&'a StatisticRecord> for CountryRow<'a> {
    fn from(s: &'a StatisticRecord) -> Self {
        Self {
            country: &s.label,
            n_responses: s.count,
        }
    }
}

/// CSV record for a per-category count
#[derive(Debug, Serialize)]
pub struct CategoryRow<'a> {
    category: &'a str,
    n_responses: u64,
}

impl<'a> From<&'a StatisticRecord> for CategoryRow<'a> {
    fn from(s: &'a StatisticRecord) -> Self {
        Self {
            category: &s.label,
            n_responses: s.count,
        }
    }
}

/// CSV record for the attachment index
#[derive(Debug, Serialize)]
pub struct AttachmentRow<'a> {
    id: u64,
    attachment_id: &'a str,
    filename: &'a str,
    status: &'static str,
    error: Option<&'a str>,
    url: &'a str,
}

impl<'a> From<&'a AttachmentRecord> for AttachmentRow<'a> {
    fn from(r: &'a AttachmentRecord) -> Self {
        Self {
            id: r.attachment.feedback_id,
            attachment_id: &r.attachment.id,
            filename: &r.file_name,
            status: r.outcome.label(),
            error: match &r.outcome {
                crate::downloader::AttachmentOutcome::Failed(reason) => Some(reason.as_str()),
                _ => None,
            },
            url: &r.attachment.url,
        }
    }
}

/// Buffered CSV writer for one table
///
/// The header row is written from the first serialized record, or from
/// `header` when the table stays empty.
pub struct CsvTableWriter<R> {
    writer: Writer<BufWriter<File>>,
    header: &'static [&'static str],
    rows_written: u64,
    _row: PhantomData<fn(&R)>,
}

impl<R: Serialize> CsvTableWriter<R> {
    /// Create a writer for `path`, creating parent directories as needed
    ///
    /// # Arguments
    /// * `path` - Output file path
    /// * `header` - Column names, used when no row is written
    pub fn new<P: AsRef<Path>>(path: P, header: &'static [&'static str]) -> OutputResult<Self> {
        let path = path.as_ref();
        debug!("Creating CSV writer: path={}", path.display());

        if let Some(parent) = path.parent() {
            super::ensure_dir(parent)?;
        }

        let file = File::create(path)
            .map_err(|e| OutputError::IoError(format!("Failed to create file {}: {e}", path.display())))?;

        let buf_writer = BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, file);

        Ok(Self {
            writer: Writer::from_writer(buf_writer),
            header,
            rows_written: 0,
            _row: PhantomData,
        })
    }

    /// Number of rows written so far
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }
}

impl<R: Serialize> TableWriter<R> for CsvTableWriter<R> {
    fn write_row(&mut self, row: &R) -> OutputResult<()> {
        self.writer
            .serialize(row)
            .map_err(|e| OutputError::CsvError(format!("Failed to write row: {e}")))?;

        self.rows_written += 1;

        if self.rows_written % FLUSH_INTERVAL == 0 {
            self.flush()?;
            debug!("Progress: {} rows written", self.rows_written);
        }

        Ok(())
    }
}

impl<R: Serialize> OutputWriter for CsvTableWriter<R> {
    fn flush(&mut self) -> OutputResult<()> {
        self.writer
            .flush()
            .map_err(|e| OutputError::FlushError(format!("Failed to flush: {e}")))
    }

    fn close(mut self) -> OutputResult<()> {
        // Empty tables still get their header row
        if self.rows_written == 0 {
            self.writer
                .write_record(self.header)
                .map_err(|e| OutputError::CsvError(format!("Failed to write header: {e}")))?;
        }

        // Final flush
        self.flush()?;

        // Get inner writer and sync to disk
        let buf_writer = self
            .writer
            .into_inner()
            .map_err(|e| OutputError::IoError(format!("Failed to get inner writer: {e}")))?;

        let file = buf_writer
            .into_inner()
            .map_err(|e| OutputError::IoError(format!("Failed to get file handle: {e}")))?;

        file.sync_all()
            .map_err(|e| OutputError::IoError(format!("Failed to sync file: {e}")))?;

        debug!("CSV writer closed: {} rows written", self.rows_written);
        Ok(())
    }
}

const FEEDBACK_HEADER: &[&str] = &[
    "id",
    "date_feedback",
    "language",
    "country",
    "user_type",
    "organization",
    "first_name",
    "surname",
    "company_size",
    "tr_number",
    "governance_level",
    "scope",
    "publication",
    "publication_status",
    "n_attachments",
    "feedback",
];
const COUNTRY_HEADER: &[&str] = &["country", "n_responses"];
const CATEGORY_HEADER: &[&str] = &["category", "n_responses"];
const ATTACHMENT_HEADER: &[&str] = &["id", "attachment_id", "filename", "status", "error", "url"];

fn write_table<'a, T, R>(path: &Path, header: &'static [&'static str], items: &'a [T]) -> OutputResult<()>
where
    R: Serialize + From<&'a T>,
{
    let mut writer = CsvTableWriter::<R>::new(path, header)?;
    for item in items {
        writer.write_row(&R::from(item))?;
    }
    debug!("Closing {} after {} rows", path.display(), writer.rows_written());
    writer.close()
}

/// Write all four tables of a scrape into `layout`
pub fn write_scrape_result(layout: &OutputLayout, result: &ScrapeResult) -> OutputResult<()> {
    super::ensure_dir(layout.root())?;

    write_table::<_, FeedbackRow>(&layout.feedbacks_csv(), FEEDBACK_HEADER, &result.feedback)?;
    write_table::<_, CountryRow>(&layout.countries_csv(), COUNTRY_HEADER, &result.countries)?;
    write_table::<_, CategoryRow>(&layout.categories_csv(), CATEGORY_HEADER, &result.categories)?;
    write_table::<_, AttachmentRow>(&layout.attachments_csv(), ATTACHMENT_HEADER, &result.attachments)?;

    info!(
        "Wrote {} feedbacks, {} countries, {} categories, {} attachments to {}",
        result.feedback.len(),
        result.countries.len(),
        result.categories.len(),
        result.attachments.len(),
        layout.root().display()
    );
    Ok(())
}
