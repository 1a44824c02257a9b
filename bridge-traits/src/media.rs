//! Media Item Model
//!
//! The unit of work flowing through the pipeline. An item is created when the
//! source lister finds it, mutated as each stage completes, and discarded at
//! the end of the run; only its ledger entry survives.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Maximum length of an error message kept on an item (in characters)
pub const MAX_ERROR_MESSAGE_CHARS: usize = 2000;

/// Processing outcome of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    #[default]
    Pending,
    Success,
    Failed,
}

impl UploadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStatus::Pending => "pending",
            UploadStatus::Success => "success",
            UploadStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UploadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(UploadStatus::Pending),
            "success" => Ok(UploadStatus::Success),
            "failed" => Ok(UploadStatus::Failed),
            other => Err(format!("unknown upload status '{}'", other)),
        }
    }
}

/// A video file discovered in the source folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    /// Source (Drive) file ID
    pub source_id: String,
    /// File name including extension
    pub name: String,
    /// Size in bytes (0 when the source omits it)
    pub size_bytes: u64,
    pub mime_type: String,
    /// Web link to the source object (may be empty)
    pub source_link: String,
    /// Scratch copy, set once the download completes
    pub local_path: Option<PathBuf>,
    /// Destination (YouTube) video ID
    pub dest_id: Option<String>,
    pub dest_url: Option<String>,
    pub status: UploadStatus,
    pub error_message: Option<String>,
    /// RFC 3339 timestamp of the terminal transition
    pub processed_at: Option<String>,
}

impl MediaItem {
    pub fn new(
        source_id: impl Into<String>,
        name: impl Into<String>,
        size_bytes: u64,
        mime_type: impl Into<String>,
        source_link: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            name: name.into(),
            size_bytes,
            mime_type: mime_type.into(),
            source_link: source_link.into(),
            local_path: None,
            dest_id: None,
            dest_url: None,
            status: UploadStatus::Pending,
            error_message: None,
            processed_at: None,
        }
    }

    /// Record a successful upload
    pub fn mark_success(
        &mut self,
        dest_id: impl Into<String>,
        dest_url: impl Into<String>,
        processed_at: impl Into<String>,
    ) {
        self.dest_id = Some(dest_id.into());
        self.dest_url = Some(dest_url.into());
        self.status = UploadStatus::Success;
        self.error_message = None;
        self.processed_at = Some(processed_at.into());
    }

    /// Record a failure; the message is capped at [`MAX_ERROR_MESSAGE_CHARS`]
    pub fn mark_failed(&mut self, error: &str, processed_at: impl Into<String>) {
        self.status = UploadStatus::Failed;
        self.error_message = Some(truncate_chars(error, MAX_ERROR_MESSAGE_CHARS));
        self.processed_at = Some(processed_at.into());
    }
}

/// Truncate to at most `max_chars` characters without splitting a code point
pub fn truncate_chars(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((byte_index, _)) => value[..byte_index].to_string(),
        None => value.to_string(),
    }
}

/// Human-readable size with two decimals (`1.50 MB`)
pub fn format_size(size_bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    let mut size = size_bytes as f64;
    for unit in UNITS {
        if size < 1024.0 {
            return format!("{:.2} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.2} TB", size)
}

/// Receives cumulative byte counts while a transfer is running
pub trait TransferProgress: Send + Sync {
    /// A transfer of `total` bytes for `label` is starting
    fn start(&self, _label: &str, _total: u64) {}

    /// `transferred` bytes are now done (cumulative, not a delta)
    fn advance(&self, transferred: u64);

    /// The transfer ended (successfully or not)
    fn finish(&self) {}
}

/// Progress sink that discards every update
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl TransferProgress for NoopProgress {
    fn advance(&self, _transferred: u64) {}
}
