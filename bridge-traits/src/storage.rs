//! Storage Abstractions
//!
//! Provides platform-agnostic traits for the media source and for secure
//! credential storage.

use async_trait::async_trait;
use std::path::Path;

use crate::error::Result;
use crate::media::{MediaItem, TransferProgress};

/// Remote media source (e.g. a Google Drive folder)
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::StorageProvider;
///
/// async fn fetch_all(source: &dyn StorageProvider) -> Result<()> {
///     let mime_types = vec!["video/mp4".to_string()];
///     for item in source.list_videos("folder-id", &mime_types).await? {
///         let path = std::env::temp_dir().join(&item.name);
///         source.download_to_file(&item, &path, &NoopProgress).await?;
///     }
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// List non-trashed objects in `folder_id` whose MIME type is in `mime_types`
    ///
    /// Follows continuation tokens until exhausted; order is the API's order.
    async fn list_videos(&self, folder_id: &str, mime_types: &[String]) -> Result<Vec<MediaItem>>;

    /// Download `item` to `destination` in fixed-size chunks
    ///
    /// Returns the number of bytes written. On any failure the partial file
    /// is removed before the error is returned.
    async fn download_to_file(
        &self,
        item: &MediaItem,
        destination: &Path,
        progress: &dyn TransferProgress,
    ) -> Result<u64>;
}

/// Secure credential storage trait
///
/// Abstracts secure storage mechanisms:
/// - macOS: Keychain
/// - Windows: DPAPI
/// - Linux: Secret Service / libsecret
///
/// # Security Requirements
///
/// Implementations MUST:
/// - Use platform-provided secure storage when available
/// - Never log or expose sensitive data
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::SecureStore;
///
/// async fn store_token(store: &dyn SecureStore, token: &str) -> Result<()> {
///     store.set_secret("oauth_token", token.as_bytes()).await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait SecureStore: Send + Sync {
    /// Store a secret value, replacing any previous value
    async fn set_secret(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Retrieve a secret value
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    async fn get_secret(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Delete a secret
    async fn delete_secret(&self, key: &str) -> Result<()>;
}
