//! Integration tests for the upload pipeline
//!
//! These tests drive `UploadPipeline` through in-memory fakes of the source,
//! publisher and notifier seams, with a real ledger file in a temp
//! directory. They cover:
//! - Idempotent re-runs
//! - Name filtering
//! - Failure recording and retry of failed items, including dry runs
//! - Scratch cleanup with and without deletion after upload
//! - Ledger state surviving a restart
//! - Bounded upload retries through the real YouTube connector

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result as BridgeResult},
    http::{HttpClient, HttpRequest, HttpResponse},
    media::{MediaItem, TransferProgress, UploadStatus},
    notify::{BestEffort, RecordNotifier},
    publish::{PublishedVideo, VideoMetadata, VideoPublisher},
    storage::StorageProvider,
    time::FixedClock,
    StaticToken,
};
use bytes::Bytes;
use chrono::{TimeZone, Utc};
use core_uploader::{
    Ledger, PipelineConfig, ProcessOptions, UploadPipeline, UploaderError,
};
use provider_youtube::{YouTubeConfig, YouTubeConnector};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

// ============================================================================
// Fakes
// ============================================================================

struct FakeSource {
    items: Vec<MediaItem>,
    fail_downloads: HashSet<String>,
    fail_listing: bool,
    downloads: AtomicUsize,
}

impl FakeSource {
    fn new(names: &[&str]) -> Self {
        Self {
            items: names
                .iter()
                .map(|name| {
                    MediaItem::new(
                        format!("id-{}", name),
                        format!("{}.mp4", name),
                        4,
                        "video/mp4",
                        format!("https://drive.google.com/file/d/id-{}/view", name),
                    )
                })
                .collect(),
            fail_downloads: HashSet::new(),
            fail_listing: false,
            downloads: AtomicUsize::new(0),
        }
    }

    fn failing_download(mut self, name: &str) -> Self {
        self.fail_downloads.insert(format!("id-{}", name));
        self
    }

    fn downloads(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StorageProvider for FakeSource {
    async fn list_videos(&self, _folder_id: &str, _mime_types: &[String]) -> BridgeResult<Vec<MediaItem>> {
        if self.fail_listing {
            return Err(BridgeError::OperationFailed("403 insufficient permissions".into()));
        }
        Ok(self.items.clone())
    }

    async fn download_to_file(
        &self,
        item: &MediaItem,
        destination: &Path,
        progress: &dyn TransferProgress,
    ) -> BridgeResult<u64> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        if self.fail_downloads.contains(&item.source_id) {
            return Err(BridgeError::OperationFailed("Drive returned 500".into()));
        }
        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(destination, b"data")?;
        progress.advance(4);
        Ok(4)
    }
}

#[derive(Default)]
struct FakePublisher {
    uploads: AtomicUsize,
    fail_names: Mutex<HashSet<String>>,
    /// Whether the scratch file existed when upload was called
    saw_scratch: Mutex<Vec<bool>>,
}

impl FakePublisher {
    fn failing(names: &[&str]) -> Self {
        let publisher = Self::default();
        publisher
            .fail_names
            .lock()
            .unwrap()
            .extend(names.iter().map(|n| format!("{}.mp4", n)));
        publisher
    }

    fn uploads(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    fn recover(&self) {
        self.fail_names.lock().unwrap().clear();
    }
}

#[async_trait]
impl VideoPublisher for FakePublisher {
    async fn upload_video(
        &self,
        item: &MediaItem,
        local_path: &Path,
        _metadata: &VideoMetadata,
        _progress: &dyn TransferProgress,
    ) -> BridgeResult<PublishedVideo> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        self.saw_scratch.lock().unwrap().push(local_path.exists());
        if self.fail_names.lock().unwrap().contains(&item.name) {
            return Err(BridgeError::OperationFailed("quotaExceeded: daily limit".into()));
        }
        let video_id = format!("yt-{}", item.source_id);
        Ok(PublishedVideo {
            url: format!("https://www.youtube.com/watch?v={}", video_id),
            video_id,
        })
    }
}

#[derive(Default)]
struct RecordingNotifier {
    records: Mutex<Vec<(String, UploadStatus)>>,
    fail: bool,
}

#[async_trait]
impl RecordNotifier for RecordingNotifier {
    async fn record(&self, item: &MediaItem) -> BestEffort<String> {
        self.records
            .lock()
            .unwrap()
            .push((item.source_id.clone(), item.status));
        if self.fail {
            BestEffort::Failed("notion unreachable".into())
        } else {
            BestEffort::Done(format!("page-{}", item.source_id))
        }
    }
}

struct Harness {
    dir: TempDir,
    source: Arc<FakeSource>,
    publisher: Arc<FakePublisher>,
    notifier: Arc<RecordingNotifier>,
}

impl Harness {
    fn new(source: FakeSource, publisher: FakePublisher, notifier: RecordingNotifier) -> Self {
        Self {
            dir: TempDir::new().unwrap(),
            source: Arc::new(source),
            publisher: Arc::new(publisher),
            notifier: Arc::new(notifier),
        }
    }

    fn ledger_path(&self) -> std::path::PathBuf {
        self.dir.path().join("processed_files.json")
    }

    fn scratch_dir(&self) -> std::path::PathBuf {
        self.dir.path().join("temp_videos")
    }

    fn pipeline(&self) -> UploadPipeline {
        self.pipeline_with(true)
    }

    fn pipeline_with(&self, delete_after_upload: bool) -> UploadPipeline {
        let config = PipelineConfig {
            folder_id: "folder-1".to_string(),
            mime_types: vec!["video/mp4".to_string()],
            scratch_dir: self.scratch_dir(),
            delete_after_upload,
        };
        let ledger = Ledger::open(self.ledger_path()).unwrap();
        UploadPipeline::new(
            config,
            self.source.clone(),
            self.publisher.clone(),
            self.notifier.clone(),
            ledger,
        )
        .with_clock(Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        )))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_second_run_does_no_transfers() {
    let h = Harness::new(
        FakeSource::new(&["a", "b", "c"]),
        FakePublisher::default(),
        RecordingNotifier::default(),
    );

    let first = h.pipeline().process(&ProcessOptions::default()).await.unwrap();
    assert_eq!(first.found, 3);
    assert_eq!(first.successful, 3);
    assert_eq!(h.source.downloads(), 3);
    assert_eq!(h.publisher.uploads(), 3);

    let second = h.pipeline().process(&ProcessOptions::default()).await.unwrap();
    assert_eq!(second.skipped, 3);
    assert_eq!(second.processed, 0);
    assert_eq!(h.source.downloads(), 3);
    assert_eq!(h.publisher.uploads(), 3);
}

#[tokio::test]
async fn test_reprocess_ignores_ledger() {
    let h = Harness::new(
        FakeSource::new(&["a"]),
        FakePublisher::default(),
        RecordingNotifier::default(),
    );
    h.pipeline().process(&ProcessOptions::default()).await.unwrap();

    let options = ProcessOptions {
        skip_processed: false,
        ..ProcessOptions::default()
    };
    let summary = h.pipeline().process(&options).await.unwrap();
    assert_eq!(summary.processed, 1);
    assert_eq!(h.publisher.uploads(), 2);
}

#[tokio::test]
async fn test_filter_selects_matching_names() {
    let h = Harness::new(
        FakeSource::new(&["a", "b", "ab"]),
        FakePublisher::default(),
        RecordingNotifier::default(),
    );
    let options = ProcessOptions {
        filter: Some("A".to_string()),
        ..ProcessOptions::default()
    };

    let summary = h.pipeline().process(&options).await.unwrap();
    assert_eq!(summary.found, 2);

    let ledger = Ledger::open(h.ledger_path()).unwrap();
    let mut names: Vec<&str> = ledger.entries().map(|(_, e)| e.name.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["a.mp4", "ab.mp4"]);
}

#[tokio::test]
async fn test_every_processed_item_is_in_ledger() {
    let h = Harness::new(
        FakeSource::new(&["ok", "bad-download", "bad-upload"]).failing_download("bad-download"),
        FakePublisher::failing(&["bad-upload"]),
        RecordingNotifier::default(),
    );

    let summary = h.pipeline().process(&ProcessOptions::default()).await.unwrap();
    assert_eq!(summary.processed, 3);
    assert_eq!(summary.successful, 1);
    assert_eq!(summary.failed, 2);

    let ledger = Ledger::open(h.ledger_path()).unwrap();
    assert_eq!(ledger.get_info("id-ok").unwrap().status, UploadStatus::Success);
    let failed = ledger.get_info("id-bad-upload").unwrap();
    assert_eq!(failed.status, UploadStatus::Failed);
    assert!(failed
        .error_message
        .as_deref()
        .unwrap()
        .contains("quotaExceeded"));
    assert_eq!(
        ledger.get_info("id-bad-download").unwrap().status,
        UploadStatus::Failed
    );
}

#[tokio::test]
async fn test_scratch_copies_removed_on_both_paths() {
    let h = Harness::new(
        FakeSource::new(&["ok", "bad"]),
        FakePublisher::failing(&["bad"]),
        RecordingNotifier::default(),
    );
    h.pipeline().process(&ProcessOptions::default()).await.unwrap();

    assert_eq!(*h.publisher.saw_scratch.lock().unwrap(), vec![true, true]);
    assert!(!h.scratch_dir().join("ok.mp4").exists());
    assert!(!h.scratch_dir().join("bad.mp4").exists());
}

#[tokio::test]
async fn test_kept_scratch_copy_when_deletion_disabled() {
    let h = Harness::new(
        FakeSource::new(&["ok", "bad"]),
        FakePublisher::failing(&["bad"]),
        RecordingNotifier::default(),
    );
    h.pipeline_with(false)
        .process(&ProcessOptions::default())
        .await
        .unwrap();

    // successes keep their copy, failures are always cleaned up
    assert_eq!(std::fs::read(h.scratch_dir().join("ok.mp4")).unwrap(), b"data");
    assert!(!h.scratch_dir().join("bad.mp4").exists());

    let ledger = Ledger::open(h.ledger_path()).unwrap();
    assert_eq!(ledger.get_info("id-ok").unwrap().status, UploadStatus::Success);
    assert_eq!(ledger.get_info("id-bad").unwrap().status, UploadStatus::Failed);
}

#[tokio::test]
async fn test_notifier_sees_terminal_status_and_failures_are_swallowed() {
    let h = Harness::new(
        FakeSource::new(&["ok", "bad"]),
        FakePublisher::failing(&["bad"]),
        RecordingNotifier {
            fail: true,
            ..RecordingNotifier::default()
        },
    );

    let summary = h.pipeline().process(&ProcessOptions::default()).await.unwrap();
    assert_eq!(summary.successful, 1);

    let records = h.notifier.records.lock().unwrap().clone();
    assert_eq!(
        records,
        vec![
            ("id-ok".to_string(), UploadStatus::Success),
            ("id-bad".to_string(), UploadStatus::Failed),
        ]
    );
}

#[tokio::test]
async fn test_dry_run_touches_nothing() {
    let h = Harness::new(
        FakeSource::new(&["a", "b"]),
        FakePublisher::default(),
        RecordingNotifier::default(),
    );
    let options = ProcessOptions {
        dry_run: true,
        ..ProcessOptions::default()
    };

    let summary = h.pipeline().process(&options).await.unwrap();
    assert_eq!(summary.found, 2);
    assert_eq!(summary.processed, 0);
    assert_eq!(h.source.downloads(), 0);
    assert!(!h.ledger_path().exists());
}

#[tokio::test]
async fn test_ledger_round_trip_across_restart() {
    let h = Harness::new(
        FakeSource::new(&["a"]),
        FakePublisher::default(),
        RecordingNotifier::default(),
    );
    h.pipeline().process(&ProcessOptions::default()).await.unwrap();

    // a fresh pipeline reads the file written by the previous one
    let pipeline = h.pipeline();
    let entry = pipeline.ledger().get_info("id-a").unwrap();
    assert!(pipeline.ledger().is_processed("id-a"));
    assert_eq!(entry.status, UploadStatus::Success);
    assert_eq!(entry.youtube_id.as_deref(), Some("yt-id-a"));
    assert_eq!(
        entry.youtube_url.as_deref(),
        Some("https://www.youtube.com/watch?v=yt-id-a")
    );
    assert_eq!(entry.processed_date, "2024-05-01T12:00:00+00:00");
}

#[tokio::test]
async fn test_clear_failed_keeps_successes() {
    let h = Harness::new(
        FakeSource::new(&["ok1", "ok2", "bad"]),
        FakePublisher::failing(&["bad"]),
        RecordingNotifier::default(),
    );
    let mut pipeline = h.pipeline();
    pipeline.process(&ProcessOptions::default()).await.unwrap();
    assert_eq!(pipeline.ledger().statistics().failed, 1);

    assert_eq!(pipeline.ledger_mut().clear_failed().unwrap(), 1);

    let stats = Ledger::open(h.ledger_path()).unwrap().statistics();
    assert_eq!(stats.failed, 0);
    assert_eq!(stats.successful, 2);
}

#[tokio::test]
async fn test_retry_failed_only_reprocesses_failures() {
    let h = Harness::new(
        FakeSource::new(&["ok", "bad"]),
        FakePublisher::failing(&["bad"]),
        RecordingNotifier::default(),
    );
    let mut pipeline = h.pipeline();
    pipeline.process(&ProcessOptions::default()).await.unwrap();
    assert_eq!(h.publisher.uploads(), 2);

    h.publisher.recover();
    let summary = pipeline.retry_failed(&ProcessOptions::default()).await.unwrap();
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.successful, 1);
    assert_eq!(h.publisher.uploads(), 3);
    assert_eq!(pipeline.ledger().statistics().successful, 2);

    // nothing left to retry
    let summary = pipeline.retry_failed(&ProcessOptions::default()).await.unwrap();
    assert_eq!(summary, Default::default());
}

#[tokio::test]
async fn test_dry_run_retry_keeps_failed_entries() {
    let h = Harness::new(
        FakeSource::new(&["ok", "bad"]),
        FakePublisher::failing(&["bad"]),
        RecordingNotifier::default(),
    );
    let mut pipeline = h.pipeline();
    pipeline.process(&ProcessOptions::default()).await.unwrap();
    let before = std::fs::read(h.ledger_path()).unwrap();

    let options = ProcessOptions {
        dry_run: true,
        ..ProcessOptions::default()
    };
    let summary = pipeline.retry_failed(&options).await.unwrap();
    assert_eq!(summary.found, 1);
    assert_eq!(summary.processed, 0);
    assert_eq!(h.publisher.uploads(), 2);
    assert_eq!(h.source.downloads(), 2);

    assert_eq!(pipeline.ledger().statistics().failed, 1);
    assert_eq!(std::fs::read(h.ledger_path()).unwrap(), before);
    assert_eq!(
        Ledger::open(h.ledger_path()).unwrap().list_failed()[0].id,
        "id-bad"
    );
}

#[tokio::test]
async fn test_list_annotates_ledger_state() {
    let h = Harness::new(
        FakeSource::new(&["done", "new"]),
        FakePublisher::default(),
        RecordingNotifier::default(),
    );
    let options = ProcessOptions {
        filter: Some("done".to_string()),
        ..ProcessOptions::default()
    };
    h.pipeline().process(&options).await.unwrap();

    let items = h.pipeline().list(None).await.unwrap();
    let done = items.iter().find(|i| i.source_id == "id-done").unwrap();
    let new = items.iter().find(|i| i.source_id == "id-new").unwrap();
    assert_eq!(done.status, UploadStatus::Success);
    assert_eq!(done.dest_id.as_deref(), Some("yt-id-done"));
    assert_eq!(new.status, UploadStatus::Pending);
    assert!(new.dest_url.is_none());
}

#[tokio::test]
async fn test_listing_failure_is_fatal() {
    let mut source = FakeSource::new(&["a"]);
    source.fail_listing = true;
    let h = Harness::new(source, FakePublisher::default(), RecordingNotifier::default());

    let result = h.pipeline().process(&ProcessOptions::default()).await;
    assert!(matches!(result, Err(UploaderError::Listing { .. })));
    assert!(!h.ledger_path().exists());
}

#[tokio::test]
async fn test_folder_override_and_missing_folder() {
    let h = Harness::new(
        FakeSource::new(&["a"]),
        FakePublisher::default(),
        RecordingNotifier::default(),
    );
    let options = ProcessOptions {
        folder: Some("https://drive.google.com/drive/folders/other-folder?usp=sharing".into()),
        dry_run: true,
        ..ProcessOptions::default()
    };
    assert!(h.pipeline().process(&options).await.is_ok());

    let ledger = Ledger::open(h.ledger_path()).unwrap();
    let mut pipeline = UploadPipeline::new(
        PipelineConfig {
            folder_id: String::new(),
            mime_types: Vec::new(),
            scratch_dir: h.scratch_dir(),
            delete_after_upload: true,
        },
        h.source.clone(),
        h.publisher.clone(),
        h.notifier.clone(),
        ledger,
    );
    let result = pipeline.process(&ProcessOptions::default()).await;
    assert!(matches!(result, Err(UploaderError::MissingFolder)));
}

#[tokio::test]
async fn test_unwritable_ledger_aborts_run() {
    let h = Harness::new(
        FakeSource::new(&["a", "b"]),
        FakePublisher::default(),
        RecordingNotifier::default(),
    );
    let mut pipeline = h.pipeline();
    // a directory where the ledger file should be makes every write fail
    std::fs::create_dir_all(h.ledger_path()).unwrap();

    let result = pipeline.process(&ProcessOptions::default()).await;
    assert!(matches!(result, Err(UploaderError::LedgerWrite { .. })));
    assert_eq!(h.publisher.uploads(), 1);
}

// ============================================================================
// Retry bound, end to end through the YouTube connector
// ============================================================================

/// Answers session initiation with a scripted list of statuses
struct ScriptedUploadApi {
    initiation: Mutex<VecDeque<u16>>,
    calls: AtomicUsize,
}

impl ScriptedUploadApi {
    fn new(initiation: &[u16]) -> Self {
        Self {
            initiation: Mutex::new(initiation.iter().copied().collect()),
            calls: AtomicUsize::new(0),
        }
    }
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

#[async_trait]
impl HttpClient for ScriptedUploadApi {
    async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if request.url.contains("uploadType=resumable") {
            let status = self.initiation.lock().unwrap().pop_front().unwrap_or(200);
            return Ok(match status {
                200 => response(200, &[("Location", "https://upload.example/session/1")], ""),
                status => response(status, &[], "backend error"),
            });
        }
        Ok(response(200, &[], r#"{"id": "vid-1"}"#))
    }
}

fn youtube(api: Arc<ScriptedUploadApi>, max_retries: u32) -> Arc<YouTubeConnector> {
    Arc::new(YouTubeConnector::new(
        api,
        Arc::new(StaticToken::new("token")),
        YouTubeConfig {
            max_retries,
            retry_base_delay: Duration::ZERO,
            ..YouTubeConfig::default()
        },
    ))
}

fn pipeline_with_publisher(h: &Harness, publisher: Arc<dyn VideoPublisher>) -> UploadPipeline {
    UploadPipeline::new(
        PipelineConfig {
            folder_id: "folder-1".to_string(),
            mime_types: vec!["video/mp4".to_string()],
            scratch_dir: h.scratch_dir(),
            delete_after_upload: true,
        },
        h.source.clone(),
        publisher,
        h.notifier.clone(),
        Ledger::open(h.ledger_path()).unwrap(),
    )
}

#[tokio::test]
async fn test_retry_budget_exhausted_marks_item_failed() {
    let h = Harness::new(
        FakeSource::new(&["a"]),
        FakePublisher::default(),
        RecordingNotifier::default(),
    );
    let api = Arc::new(ScriptedUploadApi::new(&[503, 503, 503, 503]));
    let mut pipeline = pipeline_with_publisher(&h, youtube(api.clone(), 3));

    let summary = pipeline.process(&ProcessOptions::default()).await.unwrap();
    assert_eq!(summary.failed, 1);
    assert_eq!(api.calls.load(Ordering::SeqCst), 4);

    let entry = pipeline.ledger().get_info("id-a").unwrap();
    assert_eq!(entry.status, UploadStatus::Failed);
    assert!(entry.error_message.as_deref().unwrap().contains("503"));
}

#[tokio::test]
async fn test_fewer_retryable_errors_than_budget_succeeds() {
    let h = Harness::new(
        FakeSource::new(&["a"]),
        FakePublisher::default(),
        RecordingNotifier::default(),
    );
    let api = Arc::new(ScriptedUploadApi::new(&[503, 502, 500]));
    let mut pipeline = pipeline_with_publisher(&h, youtube(api.clone(), 3));

    let summary = pipeline.process(&ProcessOptions::default()).await.unwrap();
    assert_eq!(summary.successful, 1);

    let entry = pipeline.ledger().get_info("id-a").unwrap();
    assert_eq!(entry.youtube_id.as_deref(), Some("vid-1"));
    assert_eq!(
        entry.youtube_url.as_deref(),
        Some("https://www.youtube.com/watch?v=vid-1")
    );
}
