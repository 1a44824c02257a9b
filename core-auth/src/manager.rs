//! # Credential Manager
//!
//! Run-time owner of one provider's OAuth credentials.
//!
//! ## Overview
//!
//! `CredentialManager` glues the [`OAuthFlowManager`] to a [`TokenStore`]:
//!
//! - During `--setup` it builds the authorization URL and persists whatever
//!   tokens the pasted code is exchanged for.
//! - During a run it implements [`AccessTokenProvider`], returning the cached
//!   access token or refreshing it when it expires within five minutes.
//!
//! Refreshes are serialized behind a mutex so concurrent callers never spend
//! the same refresh token twice.
//!
//! ## Usage
//!
//! ```no_run
//! use core_auth::{CredentialManager, FileTokenStore, OAuthConfig, OAuthFlowManager, ProviderKind};
//! use bridge_traits::AccessTokenProvider;
//! use std::sync::Arc;
//! # use bridge_traits::http::HttpClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! # let http_client: Arc<dyn HttpClient> = todo!();
//! let config = OAuthConfig::from_client_secrets_file(
//!     ProviderKind::GoogleDrive,
//!     "gdrive_credentials.json",
//!     &["https://www.googleapis.com/auth/drive.readonly"],
//! )?;
//! let manager = CredentialManager::new(
//!     OAuthFlowManager::new(config, http_client),
//!     Arc::new(FileTokenStore::new("gdrive_token.json")),
//! );
//!
//! let bearer = manager.access_token().await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::oauth::{OAuthFlowManager, PkceVerifier};
use crate::token_store::TokenStore;
use crate::types::{OAuthTokens, ProviderKind, DEFAULT_EXPIRY_BUFFER_SECS};
use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::time::{Clock, SystemClock};
use bridge_traits::AccessTokenProvider;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

pub struct CredentialManager {
    provider: ProviderKind,
    flow: OAuthFlowManager,
    store: Arc<dyn TokenStore>,
    cached: Mutex<Option<OAuthTokens>>,
    clock: Arc<dyn Clock>,
}

impl CredentialManager {
    pub fn new(flow: OAuthFlowManager, store: Arc<dyn TokenStore>) -> Self {
        Self {
            provider: flow.provider(),
            flow,
            store,
            cached: Mutex::new(None),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the time source used for expiry checks
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    /// Start an interactive authorization; show the URL to the user
    pub fn begin_authorization(&self) -> Result<(String, PkceVerifier)> {
        self.flow.build_auth_url()
    }

    /// Finish an interactive authorization with what the user pasted back
    #[instrument(skip(self, pasted, verifier), fields(provider = %self.provider))]
    pub async fn complete_authorization(
        &self,
        pasted: &str,
        verifier: &PkceVerifier,
    ) -> Result<OAuthTokens> {
        let tokens = self.flow.exchange_pasted_response(pasted, verifier).await?;
        self.store.save(&tokens).await?;
        *self.cached.lock().await = Some(tokens.clone());

        info!("Authorization completed");
        Ok(tokens)
    }

    /// Whether a usable token set exists (valid now, or refreshable)
    pub async fn is_authorized(&self) -> Result<bool> {
        let mut cached = self.cached.lock().await;
        if cached.is_none() {
            *cached = self.store.load().await?;
        }

        Ok(match cached.as_ref() {
            Some(tokens) => tokens.has_refresh_token() || !self.expiring(tokens),
            None => false,
        })
    }

    /// Drop stored credentials so the next setup starts from scratch
    pub async fn sign_out(&self) -> Result<()> {
        *self.cached.lock().await = None;
        self.store.clear().await
    }

    /// Valid access token, refreshing and re-persisting when needed
    #[instrument(skip(self), fields(provider = %self.provider))]
    pub async fn valid_access_token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        if cached.is_none() {
            *cached = self.store.load().await?;
        }

        let tokens = cached.as_ref().ok_or_else(|| AuthError::NotAuthenticated {
            provider: self.provider.display_name().to_string(),
        })?;

        if !self.expiring(tokens) {
            return Ok(tokens.access_token.clone());
        }

        let refresh_token = tokens
            .refresh_token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::NoRefreshToken {
                provider: self.provider.display_name().to_string(),
            })?;

        debug!(expires_at = %tokens.expires_at, "Access token expiring, refreshing");
        let refreshed = self.flow.refresh_access_token(&refresh_token).await?;
        self.store.save(&refreshed).await?;

        let access_token = refreshed.access_token.clone();
        *cached = Some(refreshed);
        Ok(access_token)
    }

    fn expiring(&self, tokens: &OAuthTokens) -> bool {
        tokens.is_expired_at(self.clock.now(), DEFAULT_EXPIRY_BUFFER_SECS)
    }
}

#[async_trait]
impl AccessTokenProvider for CredentialManager {
    async fn access_token(&self) -> BridgeResult<String> {
        self.valid_access_token().await.map_err(Into::into)
    }
}
