//! Google Drive API connector implementation
//!
//! Implements the `StorageProvider` trait for Google Drive API v3.

use async_trait::async_trait;
use bridge_traits::auth::AccessTokenProvider;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
use bridge_traits::media::{MediaItem, TransferProgress};
use bridge_traits::storage::StorageProvider;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

use crate::error::{GoogleDriveError, Result};
use crate::types::{error_message, FilesListResponse};

/// Google Drive API base URL
const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Results per listing page
const PAGE_SIZE: u32 = 100;

/// Fields to request for file resources
const LIST_FIELDS: &str = "nextPageToken, files(id, name, size, mimeType, webViewLink)";

/// Default download chunk size (50 MiB)
pub const DEFAULT_CHUNK_SIZE: u64 = 50 * 1024 * 1024;

/// Google Drive API connector
///
/// Implements `StorageProvider` for Google Drive API v3.
///
/// # Features
///
/// - Paginated folder listing with MIME type filtering
/// - Chunked downloads with `Range` requests
/// - OAuth 2.0 bearer tokens via `AccessTokenProvider`
///
/// Listing errors are not retried here; they abort the run.
///
/// # Example
///
/// ```ignore
/// use provider_google_drive::GoogleDriveConnector;
/// use bridge_traits::storage::StorageProvider;
///
/// let connector = GoogleDriveConnector::new(http_client, credentials);
/// let videos = connector.list_videos(&folder_id, &["video/mp4".into()]).await?;
/// ```
pub struct GoogleDriveConnector {
    http_client: Arc<dyn HttpClient>,
    token_provider: Arc<dyn AccessTokenProvider>,
    chunk_size: u64,
}

impl GoogleDriveConnector {
    /// Create a new Google Drive connector
    ///
    /// # Arguments
    ///
    /// * `http_client` - HTTP client implementation
    /// * `token_provider` - Source of bearer tokens with `drive.readonly` scope
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        token_provider: Arc<dyn AccessTokenProvider>,
    ) -> Self {
        Self {
            http_client,
            token_provider,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Set the number of bytes requested per download chunk
    pub fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    async fn bearer(&self) -> Result<String> {
        self.token_provider
            .access_token()
            .await
            .map_err(|e| GoogleDriveError::AuthenticationFailed(e.to_string()))
    }

    /// Build the files.list query for a folder
    fn build_query(folder_id: &str, mime_types: &[String]) -> String {
        let folder_id = folder_id.replace('\'', "\\'");
        let mime_clause = if mime_types.is_empty() {
            "mimeType contains 'video/'".to_string()
        } else {
            mime_types
                .iter()
                .map(|mime| format!("mimeType='{}'", mime))
                .collect::<Vec<_>>()
                .join(" or ")
        };

        format!(
            "'{}' in parents and trashed=false and ({})",
            folder_id, mime_clause
        )
    }

    /// Fetch one page of a folder listing
    #[instrument(skip(self, query))]
    async fn list_page(
        &self,
        query: &str,
        page_token: Option<&str>,
    ) -> Result<FilesListResponse> {
        let mut url = format!(
            "{}/files?q={}&pageSize={}&fields={}",
            DRIVE_API_BASE,
            urlencoding::encode(query),
            PAGE_SIZE,
            urlencoding::encode(LIST_FIELDS)
        );

        if let Some(token) = page_token {
            url.push_str(&format!("&pageToken={}", urlencoding::encode(token)));
        }

        let request = HttpRequest::new(HttpMethod::Get, url)
            .bearer_token(self.bearer().await?)
            .header("Accept", "application/json")
            .timeout(Duration::from_secs(30));

        let response = self
            .http_client
            .execute_with_retry(request, RetryPolicy::no_retry())
            .await?;
        if !response.is_success() {
            warn!(status = response.status, "Listing request failed");
            return Err(GoogleDriveError::ApiError {
                status_code: response.status,
                message: error_message(&response.body),
            });
        }

        serde_json::from_slice(&response.body).map_err(|e| {
            GoogleDriveError::ParseError(format!("files list response: {}", e))
        })
    }

    /// Request bytes `[offset, offset + chunk_size)` of a file
    async fn fetch_chunk(&self, file_id: &str, offset: u64) -> Result<HttpResponse> {
        let url = format!(
            "{}/files/{}?alt=media",
            DRIVE_API_BASE,
            urlencoding::encode(file_id)
        );
        let end = offset + self.chunk_size - 1;

        let request = HttpRequest::new(HttpMethod::Get, url)
            .bearer_token(self.bearer().await?)
            .header("Range", format!("bytes={}-{}", offset, end))
            .timeout(Duration::from_secs(300));

        Ok(self.http_client.execute(request).await?)
    }

    /// Stream every chunk of `item` into `file`, returning the bytes written
    async fn copy_chunks(
        &self,
        item: &MediaItem,
        file: &mut tokio::fs::File,
        progress: &dyn TransferProgress,
    ) -> Result<u64> {
        let mut offset = 0u64;
        let mut total = item.size_bytes;

        loop {
            let response = self.fetch_chunk(&item.source_id, offset).await?;

            match response.status {
                206 => {
                    if let Some(reported) = response
                        .header("Content-Range")
                        .and_then(content_range_total)
                    {
                        total = reported;
                    }

                    let received = response.body.len() as u64;
                    file.write_all(&response.body).await?;
                    offset += received;
                    progress.advance(offset);
                    debug!(offset, total, "Downloaded chunk");

                    if received < self.chunk_size || (total > 0 && offset >= total) {
                        break;
                    }
                }
                200 if offset == 0 => {
                    // Range ignored: the whole file arrived in one response
                    file.write_all(&response.body).await?;
                    offset = response.body.len() as u64;
                    progress.advance(offset);
                    break;
                }
                416 if offset == 0 && total == 0 => break,
                404 => {
                    return Err(GoogleDriveError::FileNotFound {
                        file_id: item.source_id.clone(),
                    })
                }
                status => {
                    return Err(GoogleDriveError::ApiError {
                        status_code: status,
                        message: error_message(&response.body),
                    })
                }
            }
        }

        if total > 0 && offset < total {
            return Err(GoogleDriveError::IncompleteDownload {
                file_id: item.source_id.clone(),
                received: offset,
                expected: total,
            });
        }

        file.flush().await?;
        Ok(offset)
    }

    async fn download(
        &self,
        item: &MediaItem,
        destination: &Path,
        progress: &dyn TransferProgress,
    ) -> Result<u64> {
        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::File::create(destination).await?;
        progress.start(&item.name, item.size_bytes);
        let result = self.copy_chunks(item, &mut file, progress).await;
        progress.finish();
        drop(file);

        if result.is_err() {
            if let Err(e) = tokio::fs::remove_file(destination).await {
                warn!(
                    path = %destination.display(),
                    error = %e,
                    "Failed to remove partial download"
                );
            }
        }

        result
    }
}

#[async_trait]
impl StorageProvider for GoogleDriveConnector {
    #[instrument(skip(self, mime_types))]
    async fn list_videos(
        &self,
        folder_id: &str,
        mime_types: &[String],
    ) -> BridgeResult<Vec<MediaItem>> {
        info!("Listing videos from Google Drive");
        let query = Self::build_query(folder_id, mime_types);

        let mut items = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let page = self.list_page(&query, page_token.as_deref()).await?;
            items.extend(page.files.into_iter().map(MediaItem::from));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        info!("Found {} video files", items.len());
        Ok(items)
    }

    #[instrument(skip(self, item, destination, progress), fields(file_id = %item.source_id))]
    async fn download_to_file(
        &self,
        item: &MediaItem,
        destination: &Path,
        progress: &dyn TransferProgress,
    ) -> BridgeResult<u64> {
        let written = self.download(item, destination, progress).await?;
        info!(bytes = written, path = %destination.display(), "Downloaded file");
        Ok(written)
    }
}

/// Total length from a `Content-Range: bytes a-b/total` header
fn content_range_total(value: &str) -> Option<u64> {
    value.rsplit('/').next()?.trim().parse().ok()
}
