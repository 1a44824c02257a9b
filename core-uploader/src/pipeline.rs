//! # Upload Pipeline
//!
//! Moves each video found in the source folder through
//! download, upload, notify and record, one item at a time.
//!
//! ## Per-item flow
//!
//! Success: download to the scratch directory, upload, notify, delete the
//! scratch copy, record `success` in the ledger. The scratch copy is deleted
//! before recording so a `success` entry never points at a file that still
//! exists. The one exception is `delete_after_upload = false`: the copy is
//! kept in the scratch directory and the `success` entry is written anyway.
//!
//! Failure at any transfer stage: mark the item `failed` with the error
//! text, notify, remove any scratch copy, record `failed`. The run then
//! moves on to the next item.
//!
//! Notifier problems are reported through [`BestEffort`] and never change
//! the item's outcome. Listing and ledger errors end the run.

use bridge_traits::error::Result as BridgeResult;
use bridge_traits::media::{format_size, MediaItem, NoopProgress, TransferProgress, UploadStatus};
use bridge_traits::notify::{BestEffort, RecordNotifier};
use bridge_traits::publish::{PublishedVideo, VideoMetadata, VideoPublisher};
use bridge_traits::storage::StorageProvider;
use bridge_traits::time::{Clock, SystemClock};
use core_runtime::config::{normalize_folder_id, UploaderConfig};
use core_runtime::logging::strip_path;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::error::{Result, UploaderError};
use crate::ledger::{FailedEntry, Ledger};

/// Settings the pipeline takes from [`UploaderConfig`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Folder used when a run does not name one
    pub folder_id: String,
    /// Accepted source MIME types
    pub mime_types: Vec<String>,
    /// Where downloads land before upload
    pub scratch_dir: PathBuf,
    pub delete_after_upload: bool,
}

impl From<&UploaderConfig> for PipelineConfig {
    fn from(config: &UploaderConfig) -> Self {
        Self {
            folder_id: config.gdrive_folder_id.clone(),
            mime_types: config.mime_types(),
            scratch_dir: config.temp_download_path.clone(),
            delete_after_upload: config.delete_after_upload,
        }
    }
}

/// Options for a single run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOptions {
    /// Folder ID or Drive folder URL; `None` uses the configured folder
    pub folder: Option<String>,
    /// Skip items that already have a ledger entry
    pub skip_processed: bool,
    /// Case-insensitive substring the file name must contain
    pub filter: Option<String>,
    /// Log what would be processed without transferring anything
    pub dry_run: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            folder: None,
            skip_processed: true,
            filter: None,
            dry_run: false,
        }
    }
}

/// Counters reported at the end of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Items left after the name filter
    pub found: usize,
    /// Items that went through download and upload (either outcome)
    pub processed: usize,
    pub successful: usize,
    pub failed: usize,
    /// Items skipped because the ledger already had them
    pub skipped: usize,
}

impl RunSummary {
    fn log(&self) {
        info!("{}", "=".repeat(60));
        info!("PROCESSING COMPLETE");
        info!("Videos found: {}", self.found);
        info!("Processed: {}", self.processed);
        info!("Successful: {}", self.successful);
        info!("Failed: {}", self.failed);
        info!("Skipped: {}", self.skipped);
        info!("{}", "=".repeat(60));
    }
}

/// Keep items whose name contains `filter`, ignoring case
pub fn apply_filter(items: Vec<MediaItem>, filter: Option<&str>) -> Vec<MediaItem> {
    match filter.map(str::to_lowercase).filter(|f| !f.is_empty()) {
        Some(needle) => items
            .into_iter()
            .filter(|item| item.name.to_lowercase().contains(&needle))
            .collect(),
        None => items,
    }
}

/// Scratch file name for a source object
///
/// Source names may contain path separators; they are replaced so the file
/// always lands directly inside the scratch directory.
pub fn scratch_file_name(name: &str) -> String {
    name.chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect()
}

pub struct UploadPipeline {
    config: PipelineConfig,
    source: Arc<dyn StorageProvider>,
    publisher: Arc<dyn VideoPublisher>,
    notifier: Arc<dyn RecordNotifier>,
    ledger: Ledger,
    clock: Arc<dyn Clock>,
    progress: Arc<dyn TransferProgress>,
}

impl UploadPipeline {
    pub fn new(
        config: PipelineConfig,
        source: Arc<dyn StorageProvider>,
        publisher: Arc<dyn VideoPublisher>,
        notifier: Arc<dyn RecordNotifier>,
        ledger: Ledger,
    ) -> Self {
        Self {
            config,
            source,
            publisher,
            notifier,
            ledger,
            clock: Arc::new(SystemClock),
            progress: Arc::new(NoopProgress),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Receive download and upload progress (e.g. a terminal progress bar)
    pub fn with_progress(mut self, progress: Arc<dyn TransferProgress>) -> Self {
        self.progress = progress;
        self
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }

    fn resolve_folder(&self, folder: Option<&str>) -> Result<String> {
        let folder_id = match folder.map(str::trim).filter(|f| !f.is_empty()) {
            Some(folder) => normalize_folder_id(folder),
            None => self.config.folder_id.clone(),
        };
        if folder_id.is_empty() {
            return Err(UploaderError::MissingFolder);
        }
        Ok(folder_id)
    }

    async fn list_source(&self, folder_id: &str) -> Result<Vec<MediaItem>> {
        self.source
            .list_videos(folder_id, &self.config.mime_types)
            .await
            .map_err(|source| UploaderError::Listing {
                folder_id: folder_id.to_string(),
                source,
            })
    }

    fn timestamp(&self) -> String {
        self.clock.now().to_rfc3339()
    }

    /// Process every matching item in the folder
    ///
    /// Single-item failures are recorded and counted; only listing and
    /// ledger errors are returned.
    #[instrument(skip(self, options), fields(dry_run = options.dry_run))]
    pub async fn process(&mut self, options: &ProcessOptions) -> Result<RunSummary> {
        let folder_id = self.resolve_folder(options.folder.as_deref())?;

        info!("{}", "=".repeat(60));
        info!("Starting video processing");
        info!(folder_id = %folder_id, skip_processed = options.skip_processed, "Monitoring folder");
        if let Some(filter) = &options.filter {
            info!("Filter: '{}'", filter);
        }
        if options.dry_run {
            info!("DRY RUN MODE - no downloads, uploads or ledger writes");
        }

        let stats = self.ledger.statistics();
        info!(
            "Database statistics: {} successful, {} failed, {} total",
            stats.successful, stats.failed, stats.total_processed
        );

        let items = self.list_source(&folder_id).await?;
        info!("Found {} video(s) in folder", items.len());

        let items = apply_filter(items, options.filter.as_deref());
        if options.filter.is_some() {
            info!("After filtering: {} video(s) match criteria", items.len());
        }

        let mut summary = RunSummary {
            found: items.len(),
            ..RunSummary::default()
        };
        let count = items.len();

        for (index, item) in items.into_iter().enumerate() {
            info!("--- Video {}/{} ---", index + 1, count);

            if options.skip_processed {
                if let Some(entry) = self.ledger.get_info(&item.source_id) {
                    info!(status = %entry.status, "Skipping already processed: {}", item.name);
                    if let Some(url) = &entry.youtube_url {
                        info!("  YouTube: {}", url);
                    }
                    summary.skipped += 1;
                    continue;
                }
            }

            info!(
                file_id = %item.source_id,
                size = %format_size(item.size_bytes),
                "Processing: {}",
                item.name
            );

            if options.dry_run {
                info!("DRY RUN: would process {}", item.name);
                continue;
            }

            let item = self.process_item(item).await?;
            summary.processed += 1;
            match item.status {
                UploadStatus::Success => summary.successful += 1,
                _ => summary.failed += 1,
            }
        }

        summary.log();
        Ok(summary)
    }

    /// Run one item through the pipeline and record the outcome
    ///
    /// Returns the item in its terminal state. An `Err` means the ledger
    /// could not be written.
    #[instrument(skip_all, fields(file_id = %item.source_id))]
    pub async fn process_item(&mut self, mut item: MediaItem) -> Result<MediaItem> {
        let scratch = self.config.scratch_dir.join(scratch_file_name(&item.name));

        match self.transfer(&mut item, &scratch).await {
            Ok(video) => {
                item.mark_success(video.video_id, video.url, self.timestamp());
                self.notify(&item).await;
                if self.config.delete_after_upload {
                    remove_scratch(&scratch).await;
                }
                info!(
                    url = item.dest_url.as_deref().unwrap_or_default(),
                    "Successfully processed: {}",
                    item.name
                );
            }
            Err(e) => {
                error!(error = %e, "Failed to process {}", item.name);
                item.mark_failed(&e.to_string(), self.timestamp());
                self.notify(&item).await;
                remove_scratch(&scratch).await;
            }
        }

        self.ledger.mark_processed(&item)?;
        Ok(item)
    }

    async fn transfer(&self, item: &mut MediaItem, scratch: &Path) -> BridgeResult<PublishedVideo> {
        info!("Step 1/3: Downloading from Google Drive");
        let bytes = self
            .source
            .download_to_file(item, scratch, self.progress.as_ref())
            .await?;
        item.local_path = Some(scratch.to_path_buf());
        debug!(bytes, path = %scratch.display(), "Download complete");

        info!("Step 2/3: Uploading to YouTube");
        self.publisher
            .upload_video(item, scratch, &VideoMetadata::default(), self.progress.as_ref())
            .await
    }

    async fn notify(&self, item: &MediaItem) {
        match self.notifier.record(item).await {
            BestEffort::Done(record_id) => {
                info!(record_id = %record_id, "Step 3/3: Updated Notion database")
            }
            BestEffort::Skipped => debug!("Record keeping disabled"),
            BestEffort::Failed(message) => {
                debug!(error = %message, "Record keeping failed, continuing")
            }
        }
    }

    /// Source items annotated with their ledger state
    pub async fn list(&self, folder: Option<&str>) -> Result<Vec<MediaItem>> {
        let folder_id = self.resolve_folder(folder)?;
        let mut items = self.list_source(&folder_id).await?;

        for item in &mut items {
            if let Some(entry) = self.ledger.get_info(&item.source_id) {
                item.status = entry.status;
                item.dest_id = entry.youtube_id.clone();
                item.dest_url = entry.youtube_url.clone();
                item.error_message = entry.error_message.clone();
                item.processed_at = Some(entry.processed_date.clone());
            }
        }
        Ok(items)
    }

    /// Forget failed entries, then process the folder again
    ///
    /// Only the previously failed items are picked up, since everything else
    /// is still in the ledger. A dry run lists the failed items still present
    /// in the folder and leaves the ledger untouched.
    pub async fn retry_failed(&mut self, options: &ProcessOptions) -> Result<RunSummary> {
        let failed = self.ledger.list_failed();
        if failed.is_empty() {
            info!("No failed uploads to retry");
            return Ok(RunSummary::default());
        }

        info!("Found {} failed uploads to retry", failed.len());
        for entry in &failed {
            info!(file_id = %entry.id, "Retrying: {}", entry.name);
        }

        if options.dry_run {
            return self.preview_retry(options, &failed).await;
        }
        self.ledger.clear_failed()?;

        let options = ProcessOptions {
            skip_processed: true,
            ..options.clone()
        };
        self.process(&options).await
    }

    /// Log which failed items a retry would pick up
    async fn preview_retry(
        &self,
        options: &ProcessOptions,
        failed: &[FailedEntry],
    ) -> Result<RunSummary> {
        info!("DRY RUN MODE - failed entries stay in the ledger");
        let folder_id = self.resolve_folder(options.folder.as_deref())?;
        let items = apply_filter(self.list_source(&folder_id).await?, options.filter.as_deref());

        let mut summary = RunSummary::default();
        for item in items {
            if failed.iter().any(|entry| entry.id == item.source_id) {
                info!(file_id = %item.source_id, "DRY RUN: would retry {}", item.name);
                summary.found += 1;
            }
        }
        if summary.found < failed.len() {
            info!(
                "{} failed item(s) not in the current listing",
                failed.len() - summary.found
            );
        }
        Ok(summary)
    }
}

async fn remove_scratch(path: &Path) {
    let shown = path.to_string_lossy();
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(file = %strip_path(&shown), "Cleaned up temp file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(file = %strip_path(&shown), error = %e, "Failed to remove temp file"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str) -> MediaItem {
        MediaItem::new(name, name, 1, "video/mp4", "")
    }

    #[test]
    fn test_filter_is_case_insensitive_substring() {
        let items = vec![item("Beach.mp4"), item("city.mov"), item("BEACH-2.mkv")];
        let names: Vec<String> = apply_filter(items, Some("beach"))
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["Beach.mp4", "BEACH-2.mkv"]);
    }

    #[test]
    fn test_empty_filter_keeps_everything() {
        assert_eq!(apply_filter(vec![item("a"), item("b")], Some("")).len(), 2);
        assert_eq!(apply_filter(vec![item("a")], None).len(), 1);
    }

    #[test]
    fn test_scratch_file_name() {
        assert_eq!(scratch_file_name("a\\b/c.mp4"), "a_b_c.mp4");
        assert_eq!(scratch_file_name("plain.mkv"), "plain.mkv");
    }

    #[test]
    fn test_default_options_skip_processed() {
        let options = ProcessOptions::default();
        assert!(options.skip_processed);
        assert!(!options.dry_run);
    }
}
