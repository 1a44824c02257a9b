//! YouTube Data API v3 request and response types
//!
//! See: https://developers.google.com/youtube/v3/docs/videos

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `snippet` part of a video resource
///
/// Fields the uploader does not manage are kept in `extra` so a
/// read-modify-write update does not drop them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSnippet {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `status` part sent when inserting a video
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertStatus {
    pub privacy_status: String,
    pub self_declared_made_for_kids: bool,
}

/// Body of `videos.insert`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoInsert {
    pub snippet: VideoSnippet,
    pub status: InsertStatus,
}

/// Body of `videos.update` with `part=snippet`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoUpdate {
    pub id: String,
    pub snippet: VideoSnippet,
}

/// `status` part of a video resource as returned by the API
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatusDetails {
    pub upload_status: Option<String>,
    pub privacy_status: Option<String>,
    pub failure_reason: Option<String>,
    pub rejection_reason: Option<String>,
    pub self_declared_made_for_kids: Option<bool>,
}

/// `processingDetails` part of a video resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingDetails {
    pub processing_status: Option<String>,
    pub processing_failure_reason: Option<String>,
}

/// Video resource with whichever parts were requested
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoResource {
    #[serde(default)]
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<VideoSnippet>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<VideoStatusDetails>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_details: Option<ProcessingDetails>,
}

/// `videos.list` response
#[derive(Debug, Deserialize)]
pub struct VideoListResponse {
    #[serde(default)]
    pub items: Vec<VideoResource>,
}

/// Standard Google API error envelope
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ApiErrorItem>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorItem {
    #[serde(default)]
    reason: String,
}

/// Human-readable message from an error body (`reason: message` when the
/// API supplies both), falling back to the raw text
pub fn error_message(body: &[u8]) -> String {
    match serde_json::from_slice::<ApiErrorResponse>(body) {
        Ok(parsed) => {
            let reason = parsed
                .error
                .errors
                .first()
                .map(|e| e.reason.as_str())
                .unwrap_or_default();
            match (reason.is_empty(), parsed.error.message.is_empty()) {
                (false, false) => format!("{}: {}", reason, parsed.error.message),
                (true, false) => parsed.error.message,
                (false, true) => reason.to_string(),
                (true, true) => String::from_utf8_lossy(body).trim().to_string(),
            }
        }
        Err(_) => String::from_utf8_lossy(body).trim().to_string(),
    }
}
