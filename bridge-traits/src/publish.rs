//! Destination (video hosting) abstraction

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::Result;
use crate::media::{MediaItem, TransferProgress};

/// Visibility of an uploaded video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyStatus {
    #[default]
    Private,
    Unlisted,
    Public,
}

impl PrivacyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrivacyStatus::Private => "private",
            PrivacyStatus::Unlisted => "unlisted",
            PrivacyStatus::Public => "public",
        }
    }
}

impl fmt::Display for PrivacyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrivacyStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "private" => Ok(PrivacyStatus::Private),
            "unlisted" => Ok(PrivacyStatus::Unlisted),
            "public" => Ok(PrivacyStatus::Public),
            other => Err(format!(
                "unknown privacy status '{}' (expected private, unlisted or public)",
                other
            )),
        }
    }
}

/// Caller-supplied metadata; unset fields fall back to publisher defaults
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Empty means "use the configured default tags"
    pub tags: Vec<String>,
    pub thumbnail: Option<PathBuf>,
}

/// Result of a completed upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedVideo {
    pub video_id: String,
    pub url: String,
}

/// Video hosting destination (e.g. YouTube)
#[async_trait]
pub trait VideoPublisher: Send + Sync {
    /// Upload the scratch copy of `item` found at `local_path`
    ///
    /// Transient server errors are retried inside the call up to the
    /// publisher's configured bound; an `Err` means the item failed.
    async fn upload_video(
        &self,
        item: &MediaItem,
        local_path: &Path,
        metadata: &VideoMetadata,
        progress: &dyn TransferProgress,
    ) -> Result<PublishedVideo>;
}
