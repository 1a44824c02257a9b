//! YouTube Data API connector
//!
//! Implements `VideoPublisher` with the resumable upload protocol:
//!
//! 1. `POST` the video resource to open a session; the session URI comes
//!    back in the `Location` header.
//! 2. `PUT` the file in chunks, each carrying a `Content-Range` header.
//!    `308 Resume Incomplete` plus a `Range: bytes=0-N` header means the
//!    server holds the first `N + 1` bytes.
//! 3. The final chunk is answered with `200`/`201` and the video resource.
//!
//! A 5xx response consumes one retry from a per-upload budget. After the
//! backoff sleep the session is queried (`Content-Range: bytes */total`) and
//! the upload resumes from the offset the server reports, never from the
//! offset assumed locally. A `308` answer to a chunk that leaves the server
//! offset unchanged is charged to the same budget.

use async_trait::async_trait;
use bridge_traits::auth::AccessTokenProvider;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
use bridge_traits::media::{MediaItem, TransferProgress};
use bridge_traits::notify::BestEffort;
use bridge_traits::publish::{PublishedVideo, VideoMetadata, VideoPublisher};
use bridge_traits::time::{Clock, SystemClock};
use bytes::Bytes;
use std::io::SeekFrom;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, YouTubeError};
use crate::metadata::{apply_update, build_insert, video_url, MetadataDefaults};
use crate::types::{error_message, VideoInsert, VideoListResponse, VideoResource, VideoUpdate};

const UPLOAD_URL: &str = "https://www.googleapis.com/upload/youtube/v3/videos";
const VIDEOS_URL: &str = "https://www.googleapis.com/youtube/v3/videos";
const THUMBNAIL_URL: &str = "https://www.googleapis.com/upload/youtube/v3/thumbnails/set";

/// Default upload chunk size (50 MiB, a multiple of 256 KiB)
pub const DEFAULT_CHUNK_SIZE: u64 = 50 * 1024 * 1024;

/// Large chunks on slow links take a while
const CHUNK_TIMEOUT: Duration = Duration::from_secs(600);
const API_TIMEOUT: Duration = Duration::from_secs(30);

/// Upload behaviour
#[derive(Debug, Clone)]
pub struct YouTubeConfig {
    pub defaults: MetadataDefaults,
    /// Bytes per `PUT`
    pub chunk_size: u64,
    /// Retryable errors tolerated per upload; one more fails the video
    pub max_retries: u32,
    /// Backoff before retry `n` is `retry_base_delay * 2^n`
    pub retry_base_delay: Duration,
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            defaults: MetadataDefaults::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_retries: 3,
            retry_base_delay: Duration::from_secs(1),
        }
    }
}

/// Where the upload loop goes next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Initiate,
    Send,
    Query,
}

/// Interpretation of one resumable-protocol response
#[derive(Debug)]
enum Exchange {
    /// A session was opened at this URI
    Session(String),
    /// The server holds bytes `[0, n)`
    Incomplete(u64),
    Complete(VideoResource),
    /// 5xx; the message describes the failure
    Retryable(String),
}

/// YouTube Data API v3 connector
pub struct YouTubeConnector {
    http_client: Arc<dyn HttpClient>,
    token_provider: Arc<dyn AccessTokenProvider>,
    config: YouTubeConfig,
    clock: Arc<dyn Clock>,
}

impl YouTubeConnector {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        token_provider: Arc<dyn AccessTokenProvider>,
        config: YouTubeConfig,
    ) -> Self {
        Self {
            http_client,
            token_provider,
            config,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the time source used for default descriptions
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &YouTubeConfig {
        &self.config
    }

    async fn bearer(&self) -> Result<String> {
        self.token_provider
            .access_token()
            .await
            .map_err(|e| YouTubeError::AuthenticationFailed(e.to_string()))
    }

    fn backoff(&self, retries: u32) -> Duration {
        self.config
            .retry_base_delay
            .saturating_mul(2u32.saturating_pow(retries))
    }

    /// Upload requests bypass transport-level retries; the session loop
    /// decides what happens after a failure.
    async fn send_upload_request(&self, request: HttpRequest) -> Result<HttpResponse> {
        Ok(self
            .http_client
            .execute_with_retry(request, RetryPolicy::no_retry())
            .await?)
    }

    async fn initiate_session(
        &self,
        body: &VideoInsert,
        mime_type: &str,
        total: u64,
    ) -> Result<Exchange> {
        let url = format!("{}?uploadType=resumable&part=snippet,status", UPLOAD_URL);
        let request = HttpRequest::new(HttpMethod::Post, url)
            .bearer_token(self.bearer().await?)
            .header("X-Upload-Content-Length", total.to_string())
            .header("X-Upload-Content-Type", mime_type)
            .json(body)?
            .timeout(API_TIMEOUT);

        let response = self.send_upload_request(request).await?;
        if response.is_success() {
            let uri = response
                .header("Location")
                .ok_or(YouTubeError::MissingSessionUri)?;
            debug!("Opened upload session");
            return Ok(Exchange::Session(uri.to_string()));
        }
        if response.is_server_error() {
            return Ok(Exchange::Retryable(describe(&response)));
        }
        Err(YouTubeError::Api {
            status: response.status,
            message: error_message(&response.body),
        })
    }

    async fn send_chunk(
        &self,
        session_uri: &str,
        file: &mut tokio::fs::File,
        offset: u64,
        total: u64,
    ) -> Result<Exchange> {
        let len = self.config.chunk_size.min(total.saturating_sub(offset));
        if len == 0 {
            return self.query_session(session_uri, total).await;
        }

        file.seek(SeekFrom::Start(offset)).await?;
        let mut buffer = Vec::with_capacity(len as usize);
        (&mut *file).take(len).read_to_end(&mut buffer).await?;
        if buffer.len() as u64 != len {
            return Err(YouTubeError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("file shrank while uploading (offset {})", offset),
            )));
        }

        let request = HttpRequest::new(HttpMethod::Put, session_uri)
            .bearer_token(self.bearer().await?)
            .header(
                "Content-Range",
                format!("bytes {}-{}/{}", offset, offset + len - 1, total),
            )
            .body(Bytes::from(buffer))
            .timeout(CHUNK_TIMEOUT);

        let response = self.send_upload_request(request).await?;
        interpret_upload_response(response)
    }

    async fn query_session(&self, session_uri: &str, total: u64) -> Result<Exchange> {
        let request = HttpRequest::new(HttpMethod::Put, session_uri)
            .bearer_token(self.bearer().await?)
            .header("Content-Range", format!("bytes */{}", total))
            .body(Bytes::new())
            .timeout(API_TIMEOUT);

        let response = self.send_upload_request(request).await?;
        interpret_upload_response(response)
    }

    /// Drive one resumable session to completion
    async fn resumable_upload(
        &self,
        path: &Path,
        mime_type: &str,
        body: &VideoInsert,
        progress: &dyn TransferProgress,
    ) -> Result<VideoResource> {
        let mut file = tokio::fs::File::open(path).await?;
        let total = file.metadata().await?.len();
        if total == 0 {
            return Err(YouTubeError::Api {
                status: 400,
                message: format!("{} is empty", path.display()),
            });
        }

        let mut session: Option<String> = None;
        let mut step = Step::Initiate;
        let mut offset = 0u64;
        let mut retries = 0u32;

        loop {
            let exchange = match (step, session.as_deref()) {
                (Step::Send, Some(uri)) => self.send_chunk(uri, &mut file, offset, total).await?,
                (Step::Query, Some(uri)) => self.query_session(uri, total).await?,
                _ => self.initiate_session(body, mime_type, total).await?,
            };

            // A sent chunk that leaves the server offset where it was spends
            // retry budget like a 5xx.
            let exchange = match exchange {
                Exchange::Incomplete(received)
                    if step == Step::Send && received.min(total) <= offset =>
                {
                    Exchange::Retryable(format!(
                        "upload stalled at byte {} of {}",
                        received.min(total),
                        total
                    ))
                }
                other => other,
            };

            match exchange {
                Exchange::Session(uri) => {
                    session = Some(uri);
                    step = Step::Send;
                }
                Exchange::Incomplete(received) => {
                    offset = received.min(total);
                    progress.advance(offset);
                    step = Step::Send;
                }
                Exchange::Complete(video) => {
                    progress.advance(total);
                    return Ok(video);
                }
                Exchange::Retryable(error) => {
                    retries += 1;
                    if retries > self.config.max_retries {
                        return Err(YouTubeError::RetriesExhausted {
                            attempts: retries,
                            last_error: error,
                        });
                    }

                    let delay = self.backoff(retries);
                    warn!(
                        error = %error,
                        retry = retries,
                        max_retries = self.config.max_retries,
                        delay_secs = delay.as_secs_f64(),
                        "Upload failed, retrying"
                    );
                    sleep(delay).await;

                    if session.is_some() {
                        step = Step::Query;
                    }
                }
            }
        }
    }

    /// Set a custom thumbnail; failures are logged and reported, not raised
    #[instrument(skip(self, video_id, thumbnail_path), fields(video_id = %video_id))]
    pub async fn upload_thumbnail(&self, video_id: &str, thumbnail_path: &Path) -> BestEffort<()> {
        let result = self.try_upload_thumbnail(video_id, thumbnail_path).await;
        match &result {
            Ok(()) => info!("Thumbnail uploaded"),
            Err(e) => warn!(error = %e, "Failed to upload thumbnail"),
        }
        result.into()
    }

    async fn try_upload_thumbnail(&self, video_id: &str, thumbnail_path: &Path) -> Result<()> {
        let image = tokio::fs::read(thumbnail_path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => YouTubeError::FileNotFound(thumbnail_path.to_path_buf()),
            _ => YouTubeError::Io(e),
        })?;

        let url = format!(
            "{}?videoId={}&uploadType=media",
            THUMBNAIL_URL,
            urlencoding::encode(video_id)
        );
        let request = HttpRequest::new(HttpMethod::Post, url)
            .bearer_token(self.bearer().await?)
            .header("Content-Type", image_mime_type(thumbnail_path))
            .body(Bytes::from(image))
            .timeout(API_TIMEOUT);

        let response = self.http_client.execute(request).await?;
        ensure_success(&response)
    }

    /// Processing state of an uploaded video (`status,processingDetails`)
    ///
    /// Returns `None` when the video does not exist or is not visible to the
    /// authorized channel.
    #[instrument(skip(self))]
    pub async fn get_video_status(&self, video_id: &str) -> Result<Option<VideoResource>> {
        let mut list = self.list_video(video_id, "status,processingDetails").await?;
        Ok(if list.items.is_empty() {
            None
        } else {
            Some(list.items.swap_remove(0))
        })
    }

    /// Change title, description and/or tags of an existing video
    ///
    /// Fields passed as `None` keep their current value. The same length
    /// limits as for uploads apply.
    #[instrument(skip(self, title, description, tags))]
    pub async fn update_video_metadata(
        &self,
        video_id: &str,
        title: Option<&str>,
        description: Option<&str>,
        tags: Option<&[String]>,
    ) -> Result<VideoResource> {
        let list = self.list_video(video_id, "snippet").await?;
        let mut snippet = list
            .items
            .into_iter()
            .next()
            .and_then(|video| video.snippet)
            .ok_or_else(|| YouTubeError::VideoNotFound(video_id.to_string()))?;

        apply_update(&mut snippet, title, description, tags);

        let request = HttpRequest::new(HttpMethod::Put, format!("{}?part=snippet", VIDEOS_URL))
            .bearer_token(self.bearer().await?)
            .json(&VideoUpdate {
                id: video_id.to_string(),
                snippet,
            })?
            .timeout(API_TIMEOUT);

        let response = self.http_client.execute(request).await?;
        ensure_success(&response)?;
        info!("Updated video metadata");

        serde_json::from_slice(&response.body).map_err(|e| YouTubeError::Parse(e.to_string()))
    }

    async fn list_video(&self, video_id: &str, parts: &str) -> Result<VideoListResponse> {
        let url = format!(
            "{}?part={}&id={}",
            VIDEOS_URL,
            urlencoding::encode(parts),
            urlencoding::encode(video_id)
        );
        let request = HttpRequest::new(HttpMethod::Get, url)
            .bearer_token(self.bearer().await?)
            .timeout(API_TIMEOUT);

        let response = self.http_client.execute(request).await?;
        ensure_success(&response)?;
        serde_json::from_slice(&response.body).map_err(|e| YouTubeError::Parse(e.to_string()))
    }

    async fn upload(
        &self,
        item: &MediaItem,
        local_path: &Path,
        metadata: &VideoMetadata,
        progress: &dyn TransferProgress,
    ) -> Result<PublishedVideo> {
        let file_size = match tokio::fs::metadata(local_path).await {
            Ok(meta) if meta.is_file() => meta.len(),
            _ => return Err(YouTubeError::FileNotFound(local_path.to_path_buf())),
        };

        let body = build_insert(&item.name, metadata, &self.config.defaults, self.clock.now());
        info!(
            title = %body.snippet.title,
            privacy = %body.status.privacy_status,
            "Starting YouTube upload"
        );

        let mime_type = if item.mime_type.is_empty() {
            "video/*"
        } else {
            item.mime_type.as_str()
        };

        progress.start(&item.name, file_size);
        let result = self
            .resumable_upload(local_path, mime_type, &body, progress)
            .await;
        progress.finish();

        let video = result?;
        if video.id.is_empty() {
            return Err(YouTubeError::Parse(
                "upload response did not include a video id".to_string(),
            ));
        }

        let url = video_url(&video.id);
        info!(video_id = %video.id, "Upload successful");

        if let Some(thumbnail) = &metadata.thumbnail {
            let _ = self.upload_thumbnail(&video.id, thumbnail).await;
        }

        Ok(PublishedVideo {
            video_id: video.id,
            url,
        })
    }
}

#[async_trait]
impl VideoPublisher for YouTubeConnector {
    #[instrument(skip_all, fields(file_id = %item.source_id, name = %item.name))]
    async fn upload_video(
        &self,
        item: &MediaItem,
        local_path: &Path,
        metadata: &VideoMetadata,
        progress: &dyn TransferProgress,
    ) -> BridgeResult<PublishedVideo> {
        self.upload(item, local_path, metadata, progress)
            .await
            .map_err(|e| {
                warn!(error = %e, "YouTube upload failed");
                e.into()
            })
    }
}

fn describe(response: &HttpResponse) -> String {
    format!("HTTP {}: {}", response.status, error_message(&response.body))
}

fn ensure_success(response: &HttpResponse) -> Result<()> {
    if response.is_success() {
        Ok(())
    } else {
        Err(YouTubeError::Api {
            status: response.status,
            message: error_message(&response.body),
        })
    }
}

fn interpret_upload_response(response: HttpResponse) -> Result<Exchange> {
    match response.status {
        200 | 201 => serde_json::from_slice(&response.body)
            .map(Exchange::Complete)
            .map_err(|e| YouTubeError::Parse(e.to_string())),
        308 => Ok(Exchange::Incomplete(
            response.header("Range").and_then(parse_range_end).unwrap_or(0),
        )),
        404 | 410 => Err(YouTubeError::SessionExpired),
        status if (500..600).contains(&status) => Ok(Exchange::Retryable(describe(&response))),
        status => Err(YouTubeError::Api {
            status,
            message: error_message(&response.body),
        }),
    }
}

/// Bytes held by the server according to a `Range: bytes=0-N` header
fn parse_range_end(value: &str) -> Option<u64> {
    let end: u64 = value.trim().rsplit('-').next()?.trim().parse().ok()?;
    Some(end + 1)
}

fn image_mime_type(path: &Path) -> &'static str {
    match path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::auth::StaticToken;
    use bridge_traits::media::NoopProgress;
    use mockall::{mock, Sequence};
    use std::collections::HashMap;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        }
    }

    const SESSION: &str = "https://www.googleapis.com/upload/youtube/v3/videos?upload_id=xyz";

    fn connector(http: MockHttpClient, max_retries: u32) -> YouTubeConnector {
        YouTubeConnector::new(
            Arc::new(http),
            Arc::new(StaticToken::new("yt-token")),
            YouTubeConfig {
                defaults: MetadataDefaults::default(),
                chunk_size: 4,
                max_retries,
                retry_base_delay: Duration::ZERO,
            },
        )
    }

    fn response(status: u16, headers: &[(&str, &str)], body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
            body: Bytes::from(body.to_string()),
        }
    }

    fn session_opened() -> HttpResponse {
        response(200, &[("location", SESSION)], "")
    }

    fn scratch_file(len: usize) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Holiday.mp4");
        std::fs::write(&path, vec![7u8; len]).unwrap();
        (dir, path)
    }

    fn item() -> MediaItem {
        MediaItem::new("drive1", "Holiday.mp4", 10, "video/mp4", "")
    }

    fn content_range(req: &HttpRequest) -> Option<&str> {
        req.header_value("Content-Range")
    }

    #[tokio::test]
    async fn test_upload_in_chunks() {
        let (_dir, path) = scratch_file(10);
        let mut http = MockHttpClient::new();
        let mut seq = Sequence::new();

        http.expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|req| {
                let body: serde_json::Value =
                    serde_json::from_slice(req.body.as_ref().unwrap()).unwrap();
                req.method == HttpMethod::Post
                    && req.url.contains("uploadType=resumable")
                    && req.header_value("X-Upload-Content-Length") == Some("10")
                    && req.header_value("X-Upload-Content-Type") == Some("video/mp4")
                    && body["snippet"]["title"] == "Holiday"
            })
            .returning(|_| Ok(session_opened()));
        http.expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|req| req.url == SESSION && content_range(req) == Some("bytes 0-3/10"))
            .returning(|_| Ok(response(308, &[("range", "bytes=0-3")], "")));
        http.expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|req| content_range(req) == Some("bytes 4-7/10"))
            .returning(|_| Ok(response(308, &[("range", "bytes=0-7")], "")));
        http.expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|req| {
                content_range(req) == Some("bytes 8-9/10")
                    && req.body.as_ref().map(|b| b.len()) == Some(2)
            })
            .returning(|_| Ok(response(200, &[], r#"{"id": "vid123"}"#)));

        let published = connector(http, 3)
            .upload_video(&item(), &path, &VideoMetadata::default(), &NoopProgress)
            .await
            .unwrap();

        assert_eq!(published.video_id, "vid123");
        assert_eq!(published.url, "https://www.youtube.com/watch?v=vid123");
    }

    #[tokio::test]
    async fn test_resumes_from_server_confirmed_offset() {
        let (_dir, path) = scratch_file(10);
        let mut http = MockHttpClient::new();
        let mut seq = Sequence::new();

        http.expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(session_opened()));
        http.expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|req| content_range(req) == Some("bytes 0-3/10"))
            .returning(|_| Ok(response(503, &[], "backendError")));
        // after the backoff the session is queried, not resent blindly
        http.expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|req| content_range(req) == Some("bytes */10") && req.body.as_ref().unwrap().is_empty())
            .returning(|_| Ok(response(308, &[("range", "bytes=0-1")], "")));
        http.expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|req| content_range(req) == Some("bytes 2-5/10"))
            .returning(|_| Ok(response(308, &[("range", "bytes=0-5")], "")));
        http.expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|req| content_range(req) == Some("bytes 6-9/10"))
            .returning(|_| Ok(response(201, &[], r#"{"id": "vid9"}"#)));

        let published = connector(http, 3)
            .upload_video(&item(), &path, &VideoMetadata::default(), &NoopProgress)
            .await
            .unwrap();
        assert_eq!(published.video_id, "vid9");
    }

    #[tokio::test]
    async fn test_retry_budget_is_bounded() {
        let (_dir, path) = scratch_file(10);
        let mut http = MockHttpClient::new();

        // session + (max_retries + 1) consecutive server errors
        http.expect_execute().times(4).returning(|req| {
            if req.method == HttpMethod::Post {
                Ok(session_opened())
            } else {
                Ok(response(500, &[], "internal"))
            }
        });

        let err = connector(http, 2)
            .upload(&item(), &path, &VideoMetadata::default(), &NoopProgress)
            .await
            .unwrap_err();

        match err {
            YouTubeError::RetriesExhausted { attempts, last_error } => {
                assert_eq!(attempts, 3);
                assert_eq!(last_error, "HTTP 500: internal");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_session_that_never_completes_is_bounded() {
        let (_dir, path) = scratch_file(10);
        let mut http = MockHttpClient::new();

        // every PUT claims all bytes are held but never returns the video:
        // chunk, then (stalled send, status query) per retry until the third stall
        http.expect_execute().times(7).returning(|req| {
            if req.method == HttpMethod::Post {
                Ok(session_opened())
            } else {
                Ok(response(308, &[("range", "bytes=0-9")], ""))
            }
        });

        let err = connector(http, 2)
            .upload(&item(), &path, &VideoMetadata::default(), &NoopProgress)
            .await
            .unwrap_err();

        match err {
            YouTubeError::RetriesExhausted { attempts, last_error } => {
                assert_eq!(attempts, 3);
                assert_eq!(last_error, "upload stalled at byte 10 of 10");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_session_initiation_is_retried() {
        let (_dir, path) = scratch_file(3);
        let mut http = MockHttpClient::new();
        let mut seq = Sequence::new();

        http.expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(response(502, &[], "bad gateway")));
        http.expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|req| req.method == HttpMethod::Post)
            .returning(|_| Ok(session_opened()));
        http.expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|req| content_range(req) == Some("bytes 0-2/3"))
            .returning(|_| Ok(response(200, &[], r#"{"id": "v"}"#)));

        let item = MediaItem::new("d", "short.mp4", 3, "video/mp4", "");
        let published = connector(http, 1)
            .upload(&item, &path, &VideoMetadata::default(), &NoopProgress)
            .await
            .unwrap();
        assert_eq!(published.video_id, "v");
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let (_dir, path) = scratch_file(10);
        let mut http = MockHttpClient::new();
        let mut seq = Sequence::new();

        http.expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(session_opened()));
        http.expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(response(
                    403,
                    &[],
                    r#"{"error": {"message": "Quota exceeded", "errors": [{"reason": "quotaExceeded"}]}}"#,
                ))
            });

        let err = connector(http, 3)
            .upload(&item(), &path, &VideoMetadata::default(), &NoopProgress)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "YouTube API error (status 403): quotaExceeded: Quota exceeded"
        );
    }

    #[tokio::test]
    async fn test_expired_session() {
        let (_dir, path) = scratch_file(10);
        let mut http = MockHttpClient::new();
        http.expect_execute().times(2).returning(|req| {
            if req.method == HttpMethod::Post {
                Ok(session_opened())
            } else {
                Ok(response(404, &[], "Not Found"))
            }
        });

        let err = connector(http, 3)
            .upload(&item(), &path, &VideoMetadata::default(), &NoopProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, YouTubeError::SessionExpired));
    }

    #[tokio::test]
    async fn test_missing_local_file() {
        let http = MockHttpClient::new();
        let err = connector(http, 3)
            .upload_video(
                &item(),
                Path::new("/nonexistent/Holiday.mp4"),
                &VideoMetadata::default(),
                &NoopProgress,
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Local file not found"));
    }

    #[tokio::test]
    async fn test_get_video_status() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .times(1)
            .withf(|req| req.url.contains("part=status%2CprocessingDetails") && req.url.contains("id=vid1"))
            .returning(|_| {
                Ok(response(
                    200,
                    &[],
                    r#"{"items": [{"id": "vid1", "status": {"uploadStatus": "processed", "privacyStatus": "private"}, "processingDetails": {"processingStatus": "succeeded"}}]}"#,
                ))
            });

        let video = connector(http, 3).get_video_status("vid1").await.unwrap().unwrap();
        assert_eq!(
            video.status.unwrap().upload_status.as_deref(),
            Some("processed")
        );
        assert_eq!(
            video.processing_details.unwrap().processing_status.as_deref(),
            Some("succeeded")
        );
    }

    #[tokio::test]
    async fn test_get_video_status_unknown_video() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Ok(response(200, &[], r#"{"items": []}"#)));

        assert!(connector(http, 3).get_video_status("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_video_metadata_preserves_snippet() {
        let mut http = MockHttpClient::new();
        let mut seq = Sequence::new();

        http.expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|req| req.method == HttpMethod::Get && req.url.contains("part=snippet"))
            .returning(|_| {
                Ok(response(
                    200,
                    &[],
                    r#"{"items": [{"id": "vid1", "snippet": {"title": "Old", "description": "Keep me", "categoryId": "22", "channelId": "UC1"}}]}"#,
                ))
            });
        http.expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|req| {
                let body: serde_json::Value =
                    serde_json::from_slice(req.body.as_ref().unwrap()).unwrap();
                req.method == HttpMethod::Put
                    && body["id"] == "vid1"
                    && body["snippet"]["title"] == "New"
                    && body["snippet"]["description"] == "Keep me"
                    && body["snippet"]["channelId"] == "UC1"
            })
            .returning(|req| {
                Ok(HttpResponse {
                    status: 200,
                    headers: HashMap::new(),
                    body: req.body.unwrap(),
                })
            });

        let updated = connector(http, 3)
            .update_video_metadata("vid1", Some("New"), None, None)
            .await
            .unwrap();
        assert_eq!(updated.snippet.unwrap().title, "New");
    }

    #[tokio::test]
    async fn test_update_unknown_video() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Ok(response(200, &[], r#"{"items": []}"#)));

        let err = connector(http, 3)
            .update_video_metadata("ghost", Some("t"), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, YouTubeError::VideoNotFound(id) if id == "ghost"));
    }

    #[tokio::test]
    async fn test_thumbnail_failure_is_best_effort() {
        let dir = tempfile::tempdir().unwrap();
        let thumb = dir.path().join("thumb.PNG");
        std::fs::write(&thumb, b"png").unwrap();

        let mut http = MockHttpClient::new();
        http.expect_execute()
            .times(1)
            .withf(|req| {
                req.url.contains("videoId=vid1") && req.header_value("Content-Type") == Some("image/png")
            })
            .returning(|_| Ok(response(403, &[], "forbidden")));

        let outcome = connector(http, 3).upload_thumbnail("vid1", &thumb).await;
        assert!(outcome.is_failed());

        let missing = connector(MockHttpClient::new(), 3)
            .upload_thumbnail("vid1", &dir.path().join("none.jpg"))
            .await;
        assert!(missing.is_failed());
    }

    #[test]
    fn test_parse_range_end() {
        assert_eq!(parse_range_end("bytes=0-262143"), Some(262_144));
        assert_eq!(parse_range_end("garbage"), None);
    }

    #[test]
    fn test_backoff_doubles() {
        let connector = YouTubeConnector::new(
            Arc::new(MockHttpClient::new()),
            Arc::new(StaticToken::new("t")),
            YouTubeConfig::default(),
        );
        assert_eq!(connector.backoff(1), Duration::from_secs(2));
        assert_eq!(connector.backoff(3), Duration::from_secs(8));
    }
}
