//! # Host Bridge Traits
//!
//! Abstraction traits separating the upload pipeline from the concrete
//! services and host capabilities it relies on.
//!
//! ## Overview
//!
//! The pipeline in `core-uploader` only talks to the traits defined here. The
//! provider crates (`provider-google-drive`, `provider-youtube`,
//! `provider-notion`) implement the service-facing traits on top of
//! [`HttpClient`](http::HttpClient), and `bridge-desktop` implements the host
//! capabilities (HTTP transport, keyring storage).
//!
//! ## Traits
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - Async HTTP operations with bearer auth and retry
//! - [`AccessTokenProvider`](auth::AccessTokenProvider) - Valid OAuth bearer tokens on demand
//!
//! ### Services
//! - [`StorageProvider`](storage::StorageProvider) - Source folder listing and chunked download
//! - [`VideoPublisher`](publish::VideoPublisher) - Resumable video upload
//! - [`RecordNotifier`](notify::RecordNotifier) - Best-effort external record keeping
//!
//! ### Security
//! - [`SecureStore`](storage::SecureStore) - Credential persistence (Keychain/Secret Service)
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`TransferProgress`](media::TransferProgress) - Byte-level progress reporting
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Provider
//! crates define richer error enums and convert into `BridgeError` at the seam,
//! keeping the human-readable message intact so it can be stored in the ledger.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds so implementations can be
//! shared behind `Arc` across async tasks.

pub mod auth;
pub mod error;
pub mod http;
pub mod media;
pub mod notify;
pub mod publish;
pub mod storage;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use auth::{AccessTokenProvider, StaticToken};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use media::{MediaItem, NoopProgress, TransferProgress, UploadStatus};
pub use notify::{BestEffort, NoopNotifier, RecordNotifier};
pub use publish::{PrivacyStatus, PublishedVideo, VideoMetadata, VideoPublisher};
pub use storage::{SecureStore, StorageProvider};
pub use time::{Clock, FixedClock, LogLevel, SystemClock};
