//! Google Drive API response types
//!
//! Data structures for deserializing Google Drive API v3 responses.

use bridge_traits::media::MediaItem;
use serde::{Deserialize, Serialize};

/// Google Drive API file resource, restricted to the requested fields
///
/// See: https://developers.google.com/drive/api/v3/reference/files#resource
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub mime_type: String,

    /// Size in bytes, encoded as a decimal string (omitted for Docs files)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_view_link: Option<String>,
}

impl DriveFile {
    /// Size in bytes; a missing or malformed size counts as 0
    pub fn size_bytes(&self) -> u64 {
        self.size
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0)
    }
}

impl From<DriveFile> for MediaItem {
    fn from(file: DriveFile) -> Self {
        let size = file.size_bytes();
        MediaItem::new(
            file.id,
            file.name,
            size,
            file.mime_type,
            file.web_view_link.unwrap_or_default(),
        )
    }
}

/// Google Drive API files.list response
///
/// See: https://developers.google.com/drive/api/v3/reference/files/list
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilesListResponse {
    #[serde(default)]
    pub files: Vec<DriveFile>,

    /// Token for next page
    pub next_page_token: Option<String>,
}

/// Standard Google API error envelope
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
}

/// Extract the human-readable message from an error body, falling back to
/// the raw text
pub fn error_message(body: &[u8]) -> String {
    match serde_json::from_slice::<ApiErrorResponse>(body) {
        Ok(parsed) if !parsed.error.message.is_empty() => parsed.error.message,
        _ => String::from_utf8_lossy(body).trim().to_string(),
    }
}
