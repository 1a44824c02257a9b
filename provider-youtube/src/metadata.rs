//! Video metadata defaults and YouTube field limits

use bridge_traits::media::truncate_chars;
use bridge_traits::publish::{PrivacyStatus, VideoMetadata};
use chrono::{DateTime, Local, Utc};
use serde_json::Map;
use std::path::Path;

use crate::types::{InsertStatus, VideoInsert, VideoSnippet};

pub const MAX_TITLE_CHARS: usize = 100;
pub const MAX_DESCRIPTION_CHARS: usize = 5000;
/// Combined length of all tags
pub const MAX_TAGS_CHARS: usize = 500;

/// Channel-level defaults applied to every upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataDefaults {
    pub category_id: String,
    pub privacy: PrivacyStatus,
    pub tags: Vec<String>,
}

impl Default for MetadataDefaults {
    fn default() -> Self {
        Self {
            category_id: "22".to_string(),
            privacy: PrivacyStatus::Private,
            tags: Vec::new(),
        }
    }
}

/// Watch page for a video
pub fn video_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

/// File name without its extension
pub fn default_title(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| file_name.to_string())
}

/// Description used when the caller supplies none, in local time
pub fn default_description(now: DateTime<Utc>) -> String {
    format!(
        "Uploaded from Google Drive on {}",
        now.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
    )
}

pub fn truncate_title(title: &str) -> String {
    truncate_chars(title, MAX_TITLE_CHARS)
}

pub fn truncate_description(description: &str) -> String {
    truncate_chars(description, MAX_DESCRIPTION_CHARS)
}

/// Keep tags in order while their combined length fits the limit
///
/// Blank tags are dropped; the first tag that would overflow ends the list.
pub fn truncate_tags(tags: &[String]) -> Vec<String> {
    let mut used = 0;
    let mut kept = Vec::new();
    for tag in tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        let len = tag.chars().count();
        if used + len > MAX_TAGS_CHARS {
            break;
        }
        used += len;
        kept.push(tag.to_string());
    }
    kept
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Build the `videos.insert` body for a file
pub fn build_insert(
    file_name: &str,
    metadata: &VideoMetadata,
    defaults: &MetadataDefaults,
    now: DateTime<Utc>,
) -> VideoInsert {
    let title = non_blank(&metadata.title)
        .map(str::to_string)
        .unwrap_or_else(|| default_title(file_name));
    let description = non_blank(&metadata.description)
        .map(str::to_string)
        .unwrap_or_else(|| default_description(now));
    let tags = if metadata.tags.is_empty() {
        &defaults.tags
    } else {
        &metadata.tags
    };

    VideoInsert {
        snippet: VideoSnippet {
            title: truncate_title(&title),
            description: truncate_description(&description),
            tags: truncate_tags(tags),
            category_id: Some(defaults.category_id.clone()),
            extra: Map::new(),
        },
        status: InsertStatus {
            privacy_status: defaults.privacy.as_str().to_string(),
            self_declared_made_for_kids: false,
        },
    }
}

/// Apply the provided fields to an existing snippet
pub fn apply_update(
    snippet: &mut VideoSnippet,
    title: Option<&str>,
    description: Option<&str>,
    tags: Option<&[String]>,
) {
    if let Some(title) = title.filter(|t| !t.is_empty()) {
        snippet.title = truncate_title(title);
    }
    if let Some(description) = description.filter(|d| !d.is_empty()) {
        snippet.description = truncate_description(description);
    }
    if let Some(tags) = tags.filter(|t| !t.is_empty()) {
        snippet.tags = truncate_tags(tags);
    }
}
