//! Notion database notifier
//!
//! Implements `RecordNotifier` on top of the Notion REST API. Every failure
//! is logged and reported as `BestEffort::Failed`; nothing here can abort
//! the pipeline.

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
use bridge_traits::media::MediaItem;
use bridge_traits::notify::{BestEffort, RecordNotifier};
use bridge_traits::time::{Clock, SystemClock};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::error::{NotionError, Result};
use crate::properties::build_properties;
use crate::types::{error_message, DatabaseSchema, Page, QueryResponse};

const NOTION_API_BASE: &str = "https://api.notion.com/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for one database
#[derive(Clone, PartialEq, Eq)]
pub struct NotionConfig {
    /// Integration token (`secret_...` / `ntn_...`)
    pub token: String,
    pub database_id: String,
    /// Value of the `Notion-Version` header
    pub version: String,
}

impl std::fmt::Debug for NotionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotionConfig")
            .field("token", &"[REDACTED]")
            .field("database_id", &self.database_id)
            .field("version", &self.version)
            .finish()
    }
}

pub struct NotionNotifier {
    http_client: Arc<dyn HttpClient>,
    /// `None` when the integration is disabled
    config: Option<NotionConfig>,
    clock: Arc<dyn Clock>,
}

impl NotionNotifier {
    pub fn new(http_client: Arc<dyn HttpClient>, config: Option<NotionConfig>) -> Self {
        match &config {
            Some(_) => info!("Notion integration enabled"),
            None => info!("Notion integration disabled"),
        }
        Self {
            http_client,
            config,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.config.is_some()
    }

    fn config(&self) -> Result<&NotionConfig> {
        self.config.as_ref().ok_or(NotionError::Disabled)
    }

    fn request(&self, method: HttpMethod, url: String) -> Result<HttpRequest> {
        let config = self.config()?;
        Ok(HttpRequest::new(method, url)
            .bearer_token(config.token.clone())
            .header("Notion-Version", config.version.clone())
            .timeout(REQUEST_TIMEOUT))
    }

    async fn send<T: DeserializeOwned>(&self, request: HttpRequest) -> Result<T> {
        // One attempt per request; a replayed POST would create a second page
        let response: HttpResponse = self
            .http_client
            .execute_with_retry(request, RetryPolicy::no_retry())
            .await?;
        if !response.is_success() {
            return Err(NotionError::Api {
                status: response.status,
                message: error_message(&response.body),
            });
        }
        serde_json::from_slice(&response.body).map_err(|e| NotionError::Parse(e.to_string()))
    }

    /// Create a page for `item`, returning its ID
    #[instrument(skip(self, item), fields(file_id = %item.source_id))]
    pub async fn create_entry(&self, item: &MediaItem) -> Result<String> {
        let config = self.config()?;
        let body = json!({
            "parent": { "database_id": config.database_id },
            "properties": build_properties(item, self.clock.now()),
        });

        let request = self
            .request(HttpMethod::Post, format!("{}/pages", NOTION_API_BASE))?
            .json(&body)?;
        let page: Page = self.send(request).await?;

        info!(page_id = %page.id, "Created Notion entry for {}", item.name);
        Ok(page.id)
    }

    /// Overwrite the properties of an existing page
    #[instrument(skip(self, item), fields(file_id = %item.source_id))]
    pub async fn update_entry(&self, page_id: &str, item: &MediaItem) -> Result<String> {
        let body = json!({ "properties": build_properties(item, self.clock.now()) });

        let request = self
            .request(
                HttpMethod::Patch,
                format!("{}/pages/{}", NOTION_API_BASE, urlencoding::encode(page_id)),
            )?
            .json(&body)?;
        let page: Page = self.send(request).await?;

        info!("Updated Notion entry for {}", item.name);
        Ok(page.id)
    }

    /// Page whose `Google Drive ID` equals `gdrive_id`, if any
    #[instrument(skip(self))]
    pub async fn find_entry_by_gdrive_id(&self, gdrive_id: &str) -> Result<Option<String>> {
        let config = self.config()?;
        let body = json!({
            "filter": {
                "property": "Google Drive ID",
                "rich_text": { "equals": gdrive_id }
            },
            "page_size": 1,
        });

        let request = self
            .request(
                HttpMethod::Post,
                format!(
                    "{}/databases/{}/query",
                    NOTION_API_BASE,
                    urlencoding::encode(&config.database_id)
                ),
            )?
            .json(&body)?;
        let response: QueryResponse = self.send(request).await?;

        Ok(response.results.into_iter().next().map(|page| page.id))
    }

    /// Database metadata; also serves as a reachability check
    pub async fn get_database_schema(&self) -> Result<DatabaseSchema> {
        let config = self.config()?;
        let request = self.request(
            HttpMethod::Get,
            format!(
                "{}/databases/{}",
                NOTION_API_BASE,
                urlencoding::encode(&config.database_id)
            ),
        )?;
        self.send(request).await
    }

    /// Create or update the page for `item`
    pub async fn upsert(&self, item: &MediaItem) -> Result<String> {
        let existing = match self.find_entry_by_gdrive_id(&item.source_id).await {
            Ok(found) => found,
            Err(NotionError::Disabled) => return Err(NotionError::Disabled),
            Err(e) => {
                // lookup problems should not prevent recording the outcome
                warn!(error = %e, "Notion lookup failed, creating a new entry");
                None
            }
        };

        match existing {
            Some(page_id) => {
                debug!(page_id = %page_id, "Found existing Notion entry");
                self.update_entry(&page_id, item).await
            }
            None => self.create_entry(item).await,
        }
    }
}

#[async_trait]
impl RecordNotifier for NotionNotifier {
    async fn record(&self, item: &MediaItem) -> BestEffort<String> {
        if !self.is_enabled() {
            return BestEffort::Skipped;
        }

        match self.upsert(item).await {
            Ok(page_id) => BestEffort::Done(page_id),
            Err(e) => {
                warn!(file_id = %item.source_id, error = %e, "Failed to record outcome in Notion");
                BestEffort::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bytes::Bytes;
    use mockall::{mock, Sequence};
    use std::collections::HashMap;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
            async fn execute_with_retry(
                &self,
                request: HttpRequest,
                policy: RetryPolicy,
            ) -> BridgeResult<HttpResponse>;
        }
    }

    fn config() -> NotionConfig {
        NotionConfig {
            token: "secret_abc".to_string(),
            database_id: "db123".to_string(),
            version: "2022-06-28".to_string(),
        }
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::from(body.to_string()),
        }
    }

    fn body_json(req: &HttpRequest) -> serde_json::Value {
        serde_json::from_slice(req.body.as_ref().unwrap()).unwrap()
    }

    fn item() -> MediaItem {
        let mut item = MediaItem::new("drive1", "clip.mp4", 1024, "video/mp4", "");
        item.mark_success("yt1", "https://www.youtube.com/watch?v=yt1", "2024-01-01T00:00:00+00:00");
        item
    }

    #[tokio::test]
    async fn test_disabled_notifier_skips() {
        let notifier = NotionNotifier::new(Arc::new(MockHttpClient::new()), None);
        assert_eq!(notifier.record(&item()).await, BestEffort::Skipped);
        assert!(matches!(
            notifier.create_entry(&item()).await,
            Err(NotionError::Disabled)
        ));
    }

    #[tokio::test]
    async fn test_record_creates_when_missing() {
        let mut http = MockHttpClient::new();
        let mut seq = Sequence::new();

        http.expect_execute_with_retry()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|req, policy| {
                let body = body_json(req);
                policy.max_attempts == 1
                    && req.url == "https://api.notion.com/v1/databases/db123/query"
                    && req.header_value("Notion-Version") == Some("2022-06-28")
                    && req.header_value("Authorization") == Some("Bearer secret_abc")
                    && body["filter"]["property"] == "Google Drive ID"
                    && body["filter"]["rich_text"]["equals"] == "drive1"
            })
            .returning(|_, _| Ok(response(200, r#"{"results": []}"#)));
        http.expect_execute_with_retry()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|req, policy| {
                let body = body_json(req);
                policy.max_attempts == 1
                    && req.method == HttpMethod::Post
                    && req.url == "https://api.notion.com/v1/pages"
                    && body["parent"]["database_id"] == "db123"
                    && body["properties"]["Status"]["select"]["name"] == "success"
            })
            .returning(|_, _| Ok(response(200, r#"{"id": "page-new"}"#)));

        let notifier = NotionNotifier::new(Arc::new(http), Some(config()));
        assert_eq!(
            notifier.record(&item()).await,
            BestEffort::Done("page-new".to_string())
        );
    }

    #[tokio::test]
    async fn test_record_updates_existing_page() {
        let mut http = MockHttpClient::new();
        let mut seq = Sequence::new();

        http.expect_execute_with_retry()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(response(200, r#"{"results": [{"id": "page-1"}]}"#)));
        http.expect_execute_with_retry()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|req, policy| {
                policy.max_attempts == 1
                    && req.method == HttpMethod::Patch
                    && req.url == "https://api.notion.com/v1/pages/page-1"
                    && body_json(req).get("parent").is_none()
            })
            .returning(|_, _| Ok(response(200, r#"{"id": "page-1"}"#)));

        let notifier = NotionNotifier::new(Arc::new(http), Some(config()));
        assert_eq!(
            notifier.record(&item()).await,
            BestEffort::Done("page-1".to_string())
        );
    }

    #[tokio::test]
    async fn test_lookup_failure_falls_back_to_create() {
        let mut http = MockHttpClient::new();
        let mut seq = Sequence::new();

        http.expect_execute_with_retry()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(BridgeError::OperationFailed("connection reset".into())));
        http.expect_execute_with_retry()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|req, policy| policy.max_attempts == 1 && req.url.ends_with("/pages"))
            .returning(|_, _| Ok(response(200, r#"{"id": "page-2"}"#)));

        let notifier = NotionNotifier::new(Arc::new(http), Some(config()));
        assert!(notifier.record(&item()).await.is_done());
    }

    #[tokio::test]
    async fn test_api_error_is_swallowed() {
        let mut http = MockHttpClient::new();
        http.expect_execute_with_retry().times(2).returning(|req, _| {
            if req.url.ends_with("/query") {
                Ok(response(200, r#"{"results": []}"#))
            } else {
                Ok(response(
                    400,
                    r#"{"object": "error", "code": "validation_error", "message": "Title is not a property that exists."}"#,
                ))
            }
        });

        let notifier = NotionNotifier::new(Arc::new(http), Some(config()));
        match notifier.record(&item()).await {
            BestEffort::Failed(message) => {
                assert!(message.contains("validation_error"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_get_database_schema() {
        let mut http = MockHttpClient::new();
        http.expect_execute_with_retry()
            .times(1)
            .withf(|req, policy| {
                policy.max_attempts == 1
                    && req.method == HttpMethod::Get
                    && req.url == "https://api.notion.com/v1/databases/db123"
            })
            .returning(|_, _| {
                Ok(response(
                    200,
                    r#"{"id": "db123", "title": [{"plain_text": "Uploads"}], "properties": {"Title": {"type": "title"}}}"#,
                ))
            });

        let notifier = NotionNotifier::new(Arc::new(http), Some(config()));
        let schema = notifier.get_database_schema().await.unwrap();
        assert_eq!(schema.title_text(), "Uploads");
        assert_eq!(schema.schema_problems().len(), 8);
    }

    #[tokio::test]
    async fn test_server_error_on_create_is_not_replayed() {
        let mut http = MockHttpClient::new();
        let mut seq = Sequence::new();

        http.expect_execute_with_retry()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(response(200, r#"{"results": []}"#)));
        http.expect_execute_with_retry()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|req, policy| policy.max_attempts == 1 && req.method == HttpMethod::Post)
            .returning(|_, _| Ok(response(503, "Service Unavailable")));
        http.expect_execute().never();

        let notifier = NotionNotifier::new(Arc::new(http), Some(config()));
        match notifier.record(&item()).await {
            BestEffort::Failed(message) => assert!(message.contains("503")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_config_debug_hides_token() {
        let debug = format!("{:?}", config());
        assert!(!debug.contains("secret_abc"));
    }
}
