//! Notion API response types

use serde::Deserialize;
use std::collections::BTreeMap;

use crate::properties::PROPERTY_TYPES;

/// A page as returned by create, update and query
#[derive(Debug, Clone, Deserialize)]
pub struct Page {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// `POST /v1/databases/{id}/query` response
#[derive(Debug, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub results: Vec<Page>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlainText {
    #[serde(default)]
    pub plain_text: String,
}

/// `GET /v1/databases/{id}` response, reduced to what the uploader checks
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSchema {
    pub id: String,
    #[serde(default)]
    pub title: Vec<PlainText>,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertySchema>,
}

impl DatabaseSchema {
    pub fn title_text(&self) -> String {
        self.title.iter().map(|t| t.plain_text.as_str()).collect()
    }

    /// Expected properties that are absent or have a different type
    pub fn schema_problems(&self) -> Vec<String> {
        PROPERTY_TYPES
            .iter()
            .filter_map(|(name, kind)| match self.properties.get(*name) {
                None => Some(format!("missing property '{}' ({})", name, kind)),
                Some(schema) if schema.kind != *kind => Some(format!(
                    "property '{}' is {} but should be {}",
                    name, schema.kind, kind
                )),
                Some(_) => None,
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// `code: message` from a Notion error body, or the raw text
pub fn error_message(body: &[u8]) -> String {
    match serde_json::from_slice::<ApiError>(body) {
        Ok(e) if !e.message.is_empty() => format!("{}: {}", e.code, e.message),
        _ => String::from_utf8_lossy(body).trim().to_string(),
    }
}
