//! Token Persistence
//!
//! OAuth token sets outlive the process so the user authorizes each Google
//! API once. Two backends are provided:
//!
//! - [`FileTokenStore`]: a JSON file at the configured token path, created
//!   with owner-only permissions on Unix.
//! - [`SecureTokenStore`]: the platform keychain through the `SecureStore`
//!   bridge trait.
//!
//! ## Security Features
//!
//! - Token values are never logged
//! - Corrupted entries are discarded so the user is asked to re-authorize
//!   instead of the run failing on a parse error
//!
//! ## Example
//!
//! ```no_run
//! use core_auth::{FileTokenStore, OAuthTokens, TokenStore};
//!
//! # async fn example() -> core_auth::Result<()> {
//! let store = FileTokenStore::new("youtube_token.json");
//! store.save(&OAuthTokens::new("ya29".into(), Some("1//r".into()), 3600)).await?;
//! let tokens = store.load().await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::types::{OAuthTokens, ProviderKind};
use async_trait::async_trait;
use bridge_traits::storage::SecureStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Persistence for a single provider's token set
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Stored tokens, or `None` when absent or unreadable
    async fn load(&self) -> Result<Option<OAuthTokens>>;

    /// Replace the stored tokens
    async fn save(&self, tokens: &OAuthTokens) -> Result<()>;

    /// Forget the stored tokens
    async fn clear(&self) -> Result<()>;
}

/// JSON file backend
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> Result<Option<OAuthTokens>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No token file");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice::<OAuthTokens>(&bytes) {
            Ok(tokens) => Ok(Some(tokens)),
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Token file is unreadable, re-authorization required"
                );
                Ok(None)
            }
        }
    }

    async fn save(&self, tokens: &OAuthTokens) -> Result<()> {
        let json = serde_json::to_vec_pretty(tokens)
            .map_err(|e| AuthError::SerializationFailed(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        write_private(&self.path, &json).await?;
        info!(
            path = %self.path.display(),
            has_refresh_token = tokens.has_refresh_token(),
            "Saved OAuth tokens"
        );
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(unix)]
async fn write_private(path: &Path, contents: &[u8]) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    tokio::fs::write(path, contents).await?;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn write_private(path: &Path, contents: &[u8]) -> Result<()> {
    tokio::fs::write(path, contents).await?;
    Ok(())
}

/// OS keychain backend
#[derive(Clone)]
pub struct SecureTokenStore {
    secure_store: Arc<dyn SecureStore>,
    key: String,
}

impl SecureTokenStore {
    pub fn new(secure_store: Arc<dyn SecureStore>, provider: ProviderKind) -> Self {
        Self {
            secure_store,
            key: format!("oauth_tokens:{}", provider.as_str()),
        }
    }
}

#[async_trait]
impl TokenStore for SecureTokenStore {
    async fn load(&self) -> Result<Option<OAuthTokens>> {
        let data = self
            .secure_store
            .get_secret(&self.key)
            .await
            .map_err(|e| AuthError::SecureStorageUnavailable(e.to_string()))?;

        let Some(data) = data else {
            return Ok(None);
        };

        match serde_json::from_slice::<OAuthTokens>(&data) {
            Ok(tokens) => Ok(Some(tokens)),
            Err(e) => {
                warn!(key = %self.key, error = %e, "Discarding corrupted keychain entry");
                let _ = self.secure_store.delete_secret(&self.key).await;
                Ok(None)
            }
        }
    }

    async fn save(&self, tokens: &OAuthTokens) -> Result<()> {
        let json = serde_json::to_vec(tokens)
            .map_err(|e| AuthError::SerializationFailed(e.to_string()))?;

        self.secure_store
            .set_secret(&self.key, &json)
            .await
            .map_err(|e| AuthError::SecureStorageUnavailable(e.to_string()))?;

        info!(key = %self.key, "Saved OAuth tokens to keychain");
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.secure_store
            .delete_secret(&self.key)
            .await
            .map_err(|e| AuthError::SecureStorageUnavailable(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::Result as BridgeResult;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    /// In-memory SecureStore for testing
    #[derive(Default)]
    struct MockSecureStore {
        data: Mutex<HashMap<String, Vec<u8>>>,
    }

    #[async_trait]
    impl SecureStore for MockSecureStore {
        async fn set_secret(&self, key: &str, value: &[u8]) -> BridgeResult<()> {
            self.data.lock().await.insert(key.to_string(), value.to_vec());
            Ok(())
        }

        async fn get_secret(&self, key: &str) -> BridgeResult<Option<Vec<u8>>> {
            Ok(self.data.lock().await.get(key).cloned())
        }

        async fn delete_secret(&self, key: &str) -> BridgeResult<()> {
            self.data.lock().await.remove(key);
            Ok(())
        }
    }

    fn sample_tokens() -> OAuthTokens {
        OAuthTokens::new("ya29".into(), Some("1//refresh".into()), 3600)
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("tokens").join("youtube_token.json"));

        assert!(store.load().await.unwrap().is_none());

        let tokens = sample_tokens();
        store.save(&tokens).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(tokens));

        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
        store.clear().await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_store_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gdrive_token.json");
        FileTokenStore::new(&path).save(&sample_tokens()).await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_file_store_ignores_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gdrive_token.pickle");
        std::fs::write(&path, b"\x80\x04binary pickle").unwrap();

        let store = FileTokenStore::new(&path);
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_secure_store_uses_provider_key() {
        let backend = Arc::new(MockSecureStore::default());
        let store = SecureTokenStore::new(backend.clone(), ProviderKind::YouTube);

        store.save(&sample_tokens()).await.unwrap();
        assert!(backend
            .data
            .lock()
            .await
            .contains_key("oauth_tokens:youtube"));
        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.access_token, "ya29");
        assert!(loaded.has_refresh_token());

        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_secure_store_discards_corrupted_entry() {
        let backend = Arc::new(MockSecureStore::default());
        backend
            .set_secret("oauth_tokens:google_drive", b"not json")
            .await
            .unwrap();

        let store = SecureTokenStore::new(backend.clone(), ProviderKind::GoogleDrive);
        assert!(store.load().await.unwrap().is_none());
        assert!(backend.data.lock().await.is_empty());
    }
}
