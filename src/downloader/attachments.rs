//! Attachment downloads
//!
//! Each file is streamed into a hidden temporary file inside the target
//! folder and renamed into place once complete. A failed download therefore
//! never leaves a truncated file under its final name, and a later run will
//! try it again. Files that already exist are not requested.

use indicatif::ProgressBar;
use std::fmt;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use super::DownloadError;
use crate::fetcher::HysApiClient;
use crate::AttachmentRef;

/// Name of the attachments subfolder, also used in the index file names
pub const ATTACHMENTS_DIR_NAME: &str = "attachments";

/// What happened to one attachment reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentOutcome {
    /// Downloaded in this run
    Downloaded {
        /// Bytes written
        bytes: u64,
    },
    /// File was already present; no request was made
    AlreadyPresent,
    /// Downloads were disabled
    NotRequested,
    /// Download failed; no file was written
    Failed(String),
}

impl AttachmentOutcome {
    /// Short machine-readable label used in `attachments.csv`
    pub fn label(&self) -> &'static str {
        match self {
            Self::Downloaded { .. } => "downloaded",
            Self::AlreadyPresent => "already_present",
            Self::NotRequested => "not_requested",
            Self::Failed(_) => "failed",
        }
    }

    /// Whether the file exists on disk after the run
    pub fn has_file(&self) -> bool {
        matches!(self, Self::Downloaded { .. } | Self::AlreadyPresent)
    }
}

impl fmt::Display for AttachmentOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(reason) => write!(f, "failed: {reason}"),
            other => f.write_str(other.label()),
        }
    }
}

/// One row of the attachment index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRecord {
    /// The reference from the feedback listing
    pub attachment: AttachmentRef,
    /// File path relative to the output folder (`attachments/<id>.<ext>`)
    pub file_name: String,
    /// Download result
    pub outcome: AttachmentOutcome,
}

impl AttachmentRecord {
    /// Record for a reference whose download was not attempted
    pub fn not_requested(attachment: &AttachmentRef) -> Self {
        Self::new(attachment, AttachmentOutcome::NotRequested)
    }

    fn new(attachment: &AttachmentRef, outcome: AttachmentOutcome) -> Self {
        Self {
            file_name: format!("{}/{}", ATTACHMENTS_DIR_NAME, attachment.local_file_name()),
            attachment: attachment.clone(),
            outcome,
        }
    }
}

/// Downloads attachment payloads into one folder
pub struct AttachmentDownloader<'a> {
    api: &'a HysApiClient,
    target_dir: PathBuf,
    progress: ProgressBar,
}

impl<'a> AttachmentDownloader<'a> {
    /// Create a downloader writing into `target_dir`, which must exist
    pub fn new(api: &'a HysApiClient, target_dir: impl Into<PathBuf>) -> Self {
        Self {
            api,
            target_dir: target_dir.into(),
            progress: ProgressBar::hidden(),
        }
    }

    /// Report progress on `progress`
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Download every reference, one at a time, in order
    ///
    /// Never fails as a whole: each reference gets exactly one record.
    pub async fn download_all(&self, attachments: &[AttachmentRef]) -> Vec<AttachmentRecord> {
        self.progress.set_length(attachments.len() as u64);
        let mut records = Vec::with_capacity(attachments.len());

        // local file name -> attachment id that owns it in this run
        let mut claimed: HashMap<String, &str> = HashMap::new();

        for attachment in attachments {
            let file_name = attachment.local_file_name();
            let owner = *claimed.entry(file_name.clone()).or_insert(attachment.id.as_str());

            let result = if owner != attachment.id {
                Err(DownloadError::FileNameCollision {
                    file_name,
                    owner: owner.to_string(),
                })
            } else {
                self.download_one(attachment).await
            };

            let outcome = match result {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(
                        "Attachment {} of feedback {} failed: {}",
                        attachment.id, attachment.feedback_id, e
                    );
                    AttachmentOutcome::Failed(e.to_string())
                }
            };
            records.push(AttachmentRecord::new(attachment, outcome));
            self.progress.inc(1);
        }

        self.progress.finish();

        let already = records
            .iter()
            .filter(|r| r.outcome == AttachmentOutcome::AlreadyPresent)
            .count();
        let failed = records
            .iter()
            .filter(|r| matches!(r.outcome, AttachmentOutcome::Failed(_)))
            .count();
        info!(
            "Attachments done: {} total, {} already present, {} failed",
            records.len(),
            already,
            failed
        );

        records
    }

    /// Download a single reference
    pub async fn download_one(&self, attachment: &AttachmentRef) -> Result<AttachmentOutcome, DownloadError> {
        let path = self.target_dir.join(attachment.local_file_name());

        let exists = tokio::fs::try_exists(&path)
            .await
            .map_err(|e| DownloadError::FileWriteError(format!("Failed to inspect {}: {e}", path.display())))?;
        if exists {
            debug!("Skipping {}: already present", path.display());
            return Ok(AttachmentOutcome::AlreadyPresent);
        }

        let mut download = self.api.download_attachment(attachment).await?;
        debug!(
            "Downloading attachment {} ({} bytes announced)",
            attachment.id,
            download
                .content_length()
                .map_or_else(|| "unknown".to_string(), |n| n.to_string())
        );

        let (std_file, temp_path) = tempfile::Builder::new()
            .prefix(".")
            .suffix(".part")
            .tempfile_in(&self.target_dir)
            .map_err(|e| {
                DownloadError::FileWriteError(format!(
                    "Failed to create temporary file in {}: {e}",
                    self.target_dir.display()
                ))
            })?
            .into_parts();
        let mut file = tokio::fs::File::from_std(std_file);

        let mut bytes = 0u64;
        while let Some(chunk) = download.chunk().await? {
            file.write_all(&chunk)
                .await
                .map_err(|e| DownloadError::FileWriteError(format!("Failed to write {}: {e}", path.display())))?;
            bytes += chunk.len() as u64;
        }

        file.flush()
            .await
            .map_err(|e| DownloadError::FileWriteError(format!("Failed to flush {}: {e}", path.display())))?;
        file.sync_all()
            .await
            .map_err(|e| DownloadError::FileWriteError(format!("Failed to sync {}: {e}", path.display())))?;
        // Close the handle and release the limiter before the rename
        drop(file);
        drop(download);

        temp_path
            .persist(&path)
            .map_err(|e| DownloadError::FileWriteError(format!("Failed to move into {}: {e}", path.display())))?;

        debug!("Downloaded {} ({} bytes)", path.display(), bytes);
        Ok(AttachmentOutcome::Downloaded { bytes })
    }
}
