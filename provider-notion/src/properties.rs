//! Page properties for an upload record

use bridge_traits::media::{truncate_chars, MediaItem, UploadStatus};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Map, Value};

/// Notion rejects text values longer than this
pub const MAX_TEXT_CHARS: usize = 2000;

/// Property names and the Notion type each must have
pub const PROPERTY_TYPES: &[(&str, &str)] = &[
    ("Title", "title"),
    ("Status", "select"),
    ("File Size", "number"),
    ("Google Drive Link", "url"),
    ("YouTube URL", "url"),
    ("YouTube ID", "rich_text"),
    ("Google Drive ID", "rich_text"),
    ("Upload Date", "date"),
    ("Error Message", "rich_text"),
];

fn rich_text(content: &str) -> Value {
    json!({ "rich_text": [{ "text": { "content": truncate_chars(content, MAX_TEXT_CHARS) } }] })
}

/// Size in MiB rounded to two decimals
fn size_in_mib(size_bytes: u64) -> f64 {
    (size_bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0
}

/// Build the `properties` object for `item`
///
/// Optional properties are only included when the item has a value for
/// them; `Upload Date` falls back to `now` for successful items that carry
/// no processing timestamp.
pub fn build_properties(item: &MediaItem, now: DateTime<Utc>) -> Map<String, Value> {
    let mut properties = Map::new();

    properties.insert(
        "Title".to_string(),
        json!({ "title": [{ "text": { "content": truncate_chars(&item.name, MAX_TEXT_CHARS) } }] }),
    );
    properties.insert(
        "Status".to_string(),
        json!({ "select": { "name": item.status.as_str() } }),
    );
    properties.insert("Google Drive ID".to_string(), rich_text(&item.source_id));

    if item.size_bytes > 0 {
        properties.insert(
            "File Size".to_string(),
            json!({ "number": size_in_mib(item.size_bytes) }),
        );
    }
    if !item.source_link.is_empty() {
        properties.insert(
            "Google Drive Link".to_string(),
            json!({ "url": item.source_link }),
        );
    }
    if let Some(url) = item.dest_url.as_deref().filter(|u| !u.is_empty()) {
        properties.insert("YouTube URL".to_string(), json!({ "url": url }));
    }
    if let Some(id) = item.dest_id.as_deref().filter(|i| !i.is_empty()) {
        properties.insert("YouTube ID".to_string(), rich_text(id));
    }

    let upload_date = match (&item.processed_at, item.status) {
        (Some(processed_at), _) => Some(processed_at.clone()),
        (None, UploadStatus::Success) => Some(now.to_rfc3339_opts(SecondsFormat::Secs, true)),
        (None, _) => None,
    };
    if let Some(start) = upload_date {
        properties.insert("Upload Date".to_string(), json!({ "date": { "start": start } }));
    }

    if let Some(error) = item.error_message.as_deref().filter(|e| !e.is_empty()) {
        properties.insert("Error Message".to_string(), rich_text(error));
    }

    properties
}
