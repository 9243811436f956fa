//! Scrape command implementation

use crate::downloader::{ScrapeResult, Scraper, ScraperConfig};
use crate::identifier::PublicationId;
use crate::output::{self, OutputLayout};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use super::CliError;

/// Upper bound for `--sleep-time`, one hour
const MAX_SLEEP_TIME_SECS: f64 = 3600.0;

/// Parse and validate the delay between requests, in seconds
fn parse_sleep_time(s: &str) -> Result<Duration, String> {
    let secs: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number of seconds"))?;

    if !secs.is_finite() || secs < 0.0 {
        return Err("sleep time must be a non-negative number of seconds".to_string());
    }
    if secs > MAX_SLEEP_TIME_SECS {
        return Err(format!(
            "sleep time {secs} exceeds maximum of {MAX_SLEEP_TIME_SECS} seconds"
        ));
    }
    Ok(Duration::from_secs_f64(secs))
}

/// Scrape feedback and statistics from the European Commission's 'Have your Say' platform
#[derive(Parser, Debug)]
#[command(name = "hys-scraper", version, about)]
pub struct Cli {
    /// The publication id - what comes after 'p_id=' in the initiative's URL
    #[arg(value_name = "PID")]
    pub publication_id: PublicationId,

    /// Directory to save the CSV files and attachments to.
    /// Defaults to a new folder in the working directory named after the initiative.
    #[arg(long = "dir", visible_alias = "target-dir", alias = "target_dir", value_name = "DIR")]
    pub target_dir: Option<PathBuf>,

    /// Skip the download of attachments
    #[arg(long = "no-attachments", alias = "no_attachments", default_value_t = false)]
    pub no_attachments: bool,

    /// Minimum time between consecutive HTTP requests, in seconds
    #[arg(
        long = "sleep-time",
        alias = "sleep_time",
        value_name = "SECONDS",
        default_value = "1",
        value_parser = parse_sleep_time
    )]
    pub sleep_time: Duration,

    /// Number of feedback submissions per page (default: platform decides)
    #[arg(long = "page-size", alias = "page_size", value_parser = clap::value_parser!(u32).range(1..=1000))]
    pub page_size: Option<u32>,

    /// Base URL of the platform
    #[arg(long, hide = true)]
    pub base_url: Option<String>,
}

impl Cli {
    /// Scraper configuration described by the flags
    pub fn scraper_config(&self) -> ScraperConfig {
        let mut config = ScraperConfig::default().with_min_delay(self.sleep_time);
        if let Some(base_url) = &self.base_url {
            config = config.with_base_url(base_url.clone());
        }
        if let Some(page_size) = self.page_size {
            config = config.with_page_size(page_size);
        }
        if self.no_attachments {
            config = config.without_attachments();
        }
        config
    }

    /// Run the scrape and write all output files
    ///
    /// # Returns
    /// The output layout used and the scrape result
    pub async fn execute(&self) -> Result<(OutputLayout, ScrapeResult), CliError> {
        let config = self.scraper_config();
        let download_attachments = config.download_attachments;
        let scraper = Scraper::new(self.publication_id.clone(), config)?;

        let layout = match &self.target_dir {
            Some(dir) => OutputLayout::new(dir.clone()),
            None => {
                let title = match scraper.publication_title().await {
                    Ok(title) => Some(title),
                    Err(e) => {
                        warn!("Could not fetch the initiative's title, naming folder by id only: {}", e);
                        None
                    }
                };
                OutputLayout::resolve(None, &self.publication_id, title.as_deref())
            }
        };

        output::ensure_dir(layout.root())?;
        info!("Writing output to {}", layout.root().display());

        let scraper = if download_attachments {
            scraper
                .with_attachments_dir(layout.attachments_dir())
                .with_progress(create_progress_bar())
        } else {
            scraper
        };

        let result = scraper.scrape().await?;
        output::write_scrape_result(&layout, &result)?;

        let failed = result.failed_attachments().count();
        if failed > 0 {
            warn!(
                "{} attachment(s) could not be downloaded, see {}",
                failed,
                layout.attachments_csv().display()
            );
        }

        info!(
            "Scraped {} feedback submissions for publication {}",
            result.feedback.len(),
            self.publication_id
        );
        Ok((layout, result))
    }
}

fn create_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} attachments")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}
