//! # Processed Files Ledger
//!
//! Local record of every file the pipeline has finished with, keyed by the
//! Drive file ID. The ledger is what makes re-runs idempotent: an item with
//! an entry is skipped unless the caller asks to reprocess.
//!
//! ## Persistence
//!
//! The whole ledger is a single pretty-printed JSON object. It is read once
//! when opened and rewritten in full after every mutation. Before each write
//! the current file is copied to a `<name>.backup` sibling, so one previous
//! generation is always kept. Writes are not atomic and nothing locks the
//! file; a single process is expected to own it.
//!
//! ```json
//! {
//!   "1AbC...": {
//!     "error_message": null,
//!     "name": "holiday.mp4",
//!     "processed_date": "2024-05-01T10:30:00+00:00",
//!     "size": 52428800,
//!     "status": "success",
//!     "youtube_id": "dQw4w9WgXcQ",
//!     "youtube_url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
//!   }
//! }
//! ```

use bridge_traits::media::{format_size, MediaItem, UploadStatus};
use bridge_traits::time::{Clock, SystemClock};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{Result, UploaderError};
use crate::export::CsvWriter;

/// Outcome recorded for one source file
///
/// Fields are declared in alphabetical order so the JSON document keeps
/// sorted keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub processed_date: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub status: UploadStatus,
    #[serde(default)]
    pub youtube_id: Option<String>,
    #[serde(default)]
    pub youtube_url: Option<String>,
}

impl LedgerEntry {
    /// Snapshot of `item`; `now` is used when the item carries no timestamp
    pub fn from_item(item: &MediaItem, now: &str) -> Self {
        Self {
            error_message: item.error_message.clone(),
            name: item.name.clone(),
            processed_date: item
                .processed_at
                .clone()
                .unwrap_or_else(|| now.to_string()),
            size: item.size_bytes,
            status: item.status,
            youtube_id: item.dest_id.clone(),
            youtube_url: item.dest_url.clone(),
        }
    }

    /// Values in the same order as [`CSV_FIELDS`]
    fn csv_values(&self) -> [String; 7] {
        [
            self.error_message.clone().unwrap_or_default(),
            self.name.clone(),
            self.processed_date.clone(),
            self.size.to_string(),
            self.status.as_str().to_string(),
            self.youtube_id.clone().unwrap_or_default(),
            self.youtube_url.clone().unwrap_or_default(),
        ]
    }
}

/// Entry columns, sorted by name
const CSV_FIELDS: [&str; 7] = [
    "error_message",
    "name",
    "processed_date",
    "size",
    "status",
    "youtube_id",
    "youtube_url",
];

/// Counts by status and the total size of everything recorded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerStatistics {
    pub total_processed: usize,
    pub successful: usize,
    pub failed: usize,
    pub pending: usize,
    pub total_size_bytes: u64,
}

impl LedgerStatistics {
    pub fn total_size_formatted(&self) -> String {
        format_size(self.total_size_bytes)
    }
}

/// A failed entry, as listed by `stats --failed` and `retry`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedEntry {
    pub id: String,
    pub name: String,
    pub error: Option<String>,
    pub date: String,
}

/// JSON-file backed map from Drive file ID to [`LedgerEntry`]
pub struct Ledger {
    path: PathBuf,
    entries: BTreeMap<String, LedgerEntry>,
    clock: Arc<dyn Clock>,
}

impl Ledger {
    /// Load the ledger at `path`
    ///
    /// A missing file yields an empty ledger. A file that is not valid JSON
    /// is logged and also yields an empty ledger; its content survives in
    /// the `.backup` sibling after the next write. Any other read failure is
    /// returned.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = load_entries(&path)?;
        info!(
            path = %path.display(),
            "Loaded {} processed files from database",
            entries.len()
        );

        Ok(Self {
            path,
            entries,
            clock: Arc::new(SystemClock),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling holding the previous generation
    pub fn backup_path(&self) -> PathBuf {
        backup_path(&self.path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &LedgerEntry)> {
        self.entries.iter()
    }

    pub fn is_processed(&self, file_id: &str) -> bool {
        self.entries.contains_key(file_id)
    }

    pub fn get_info(&self, file_id: &str) -> Option<&LedgerEntry> {
        self.entries.get(file_id)
    }

    /// Insert or replace the entry for `item` and persist
    pub fn mark_processed(&mut self, item: &MediaItem) -> Result<()> {
        let now = self.clock.now().to_rfc3339();
        self.entries
            .insert(item.source_id.clone(), LedgerEntry::from_item(item, &now));
        self.save()?;
        info!(file_id = %item.source_id, "Marked as processed: {}", item.name);
        Ok(())
    }

    /// Remove the entry for `file_id`; returns whether one existed
    pub fn remove(&mut self, file_id: &str) -> Result<bool> {
        match self.entries.remove(file_id) {
            Some(entry) => {
                self.save()?;
                info!(file_id, "Removed from processed: {}", entry.name);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn statistics(&self) -> LedgerStatistics {
        let mut stats = LedgerStatistics {
            total_processed: self.entries.len(),
            ..LedgerStatistics::default()
        };
        for entry in self.entries.values() {
            match entry.status {
                UploadStatus::Success => stats.successful += 1,
                UploadStatus::Failed => stats.failed += 1,
                UploadStatus::Pending => stats.pending += 1,
            }
            stats.total_size_bytes += entry.size;
        }
        stats
    }

    pub fn list_failed(&self) -> Vec<FailedEntry> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.status == UploadStatus::Failed)
            .map(|(id, entry)| FailedEntry {
                id: id.clone(),
                name: entry.name.clone(),
                error: entry.error_message.clone(),
                date: entry.processed_date.clone(),
            })
            .collect()
    }

    /// Drop every failed entry, leaving the rest untouched
    ///
    /// The file is only rewritten when something was removed.
    pub fn clear_failed(&mut self) -> Result<usize> {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.status != UploadStatus::Failed);
        let removed = before - self.entries.len();

        if removed > 0 {
            self.save()?;
            info!("Cleared {} failed entries from database", removed);
        }
        Ok(removed)
    }

    /// Drop every entry
    pub fn clear_all(&mut self) -> Result<usize> {
        let removed = self.entries.len();
        self.entries.clear();
        self.save()?;
        info!("Cleared {} entries from database", removed);
        Ok(removed)
    }

    /// Write the ledger as CSV (`file_id` then the sorted entry fields)
    ///
    /// Returns the number of rows written. An empty ledger writes nothing.
    pub fn export_csv(&self, output: &Path) -> Result<usize> {
        if self.entries.is_empty() {
            warn!("No processed files to export");
            return Ok(0);
        }

        let export_error = |source| UploaderError::Export {
            path: output.to_path_buf(),
            source,
        };

        let file = std::fs::File::create(output).map_err(export_error)?;
        let mut writer = CsvWriter::new(std::io::BufWriter::new(file));

        writer
            .write_record(std::iter::once("file_id").chain(CSV_FIELDS))
            .map_err(export_error)?;
        for (file_id, entry) in &self.entries {
            let values = entry.csv_values();
            writer
                .write_record(
                    std::iter::once(file_id.as_str()).chain(values.iter().map(String::as_str)),
                )
                .map_err(export_error)?;
        }
        writer.into_inner().map_err(export_error)?;

        info!(
            path = %output.display(),
            "Exported {} entries",
            self.entries.len()
        );
        Ok(self.entries.len())
    }

    fn save(&self) -> Result<()> {
        let write_error = |source| UploaderError::LedgerWrite {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }

        if self.path.exists() {
            std::fs::copy(&self.path, self.backup_path()).map_err(write_error)?;
        }

        let json = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&self.path, json).map_err(write_error)
    }
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".backup");
    PathBuf::from(name)
}

fn load_entries(path: &Path) -> Result<BTreeMap<String, LedgerEntry>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(source) => {
            return Err(UploaderError::LedgerRead {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    match serde_json::from_str(&content) {
        Ok(entries) => Ok(entries),
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                "Could not parse processed files database, starting with empty database"
            );
            Ok(BTreeMap::new())
        }
    }
}
