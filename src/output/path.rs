//! Output folder layout
//!
//! ```text
//! <root>/
//! ├── feedbacks.csv
//! ├── countries.csv
//! ├── categories.csv
//! ├── attachments.csv
//! └── attachments/
//!     └── <attachment id>.<ext>
//! ```
//!
//! Without an explicit target directory the root is a folder in the current
//! directory named `<publication id>_<snake_cased short title>`, or just
//! `<publication id>` when the title is unavailable.
//!
//! # Usage Example
//!
//! ```rust
//! use hys_scraper::identifier::PublicationId;
//! use hys_scraper::output::OutputLayout;
//! use std::path::Path;
//!
//! let id = PublicationId::parse("24212003").unwrap();
//! let layout = OutputLayout::resolve(None, &id, Some("Requirements for Artificial Intelligence"));
//!
//! assert_eq!(
//!     layout.root(),
//!     Path::new("24212003_requirements_for_artificial_intelligence")
//! );
//! assert!(layout.attachments_dir().ends_with("attachments"));
//! ```

use crate::downloader::attachments::ATTACHMENTS_DIR_NAME;
use crate::fetcher::hys_parser::snake_case;
use crate::identifier::PublicationId;
use std::path::{Path, PathBuf};

/// Feedback table file name
pub const FEEDBACKS_FILE: &str = "feedbacks.csv";
/// Country statistics file name
pub const COUNTRIES_FILE: &str = "countries.csv";
/// Category statistics file name
pub const CATEGORIES_FILE: &str = "categories.csv";
/// Attachment index file name
pub const ATTACHMENTS_FILE: &str = "attachments.csv";

/// Paths of everything a scrape writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    /// Layout rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Pick the output root
    ///
    /// # Arguments
    ///
    /// * `target_dir` - Explicit directory; used as-is when given
    /// * `publication_id` - Initiative id
    /// * `title` - Initiative short title, if it could be fetched
    pub fn resolve(target_dir: Option<PathBuf>, publication_id: &PublicationId, title: Option<&str>) -> Self {
        match target_dir {
            Some(dir) => Self::new(dir),
            None => Self::new(default_folder_name(publication_id, title)),
        }
    }

    /// Output root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `feedbacks.csv`
    pub fn feedbacks_csv(&self) -> PathBuf {
        self.root.join(FEEDBACKS_FILE)
    }

    /// `countries.csv`
    pub fn countries_csv(&self) -> PathBuf {
        self.root.join(COUNTRIES_FILE)
    }

    /// `categories.csv`
    pub fn categories_csv(&self) -> PathBuf {
        self.root.join(CATEGORIES_FILE)
    }

    /// `attachments.csv`
    pub fn attachments_csv(&self) -> PathBuf {
        self.root.join(ATTACHMENTS_FILE)
    }

    /// `attachments/`
    pub fn attachments_dir(&self) -> PathBuf {
        self.root.join(ATTACHMENTS_DIR_NAME)
    }
}

/// Folder name for an initiative: `<id>_<snake_cased title>` or `<id>`
pub fn default_folder_name(publication_id: &PublicationId, title: Option<&str>) -> String {
    match title.map(|t| sanitize_component(&snake_case(t.trim()))) {
        Some(name) if !name.is_empty() => format!("{publication_id}_{name}"),
        _ => publication_id.to_string(),
    }
}

/// Sanitize a path component for filesystem safety
///
/// - `/`, `\`, `:` and other reserved characters → `_`
/// - `..` → `__`
fn sanitize_component(name: &str) -> String {
    name.replace("..", "__")
        .replace(['/', '\\', ':', '*', '?', '"', '<', '>', '|'], "_")
}
