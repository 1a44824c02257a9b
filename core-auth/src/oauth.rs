//! OAuth 2.0 Authorization Flow Manager with PKCE Support
//!
//! This module implements RFC 6749 (OAuth 2.0) and RFC 7636 (PKCE) for the
//! "installed application" flow Google uses for command-line tools.
//!
//! # Overview
//!
//! The OAuth flow manager handles:
//! - Loading client credentials from a Google client secrets file
//! - Building authorization URLs with a PKCE challenge
//! - Exchanging the pasted authorization code for tokens
//! - Refreshing access tokens
//!
//! # Security
//!
//! - Generates cryptographically secure random state and code verifier
//! - Validates the state parameter when the user pastes the full redirect URL
//! - Never logs sensitive values (tokens, codes, verifiers)
//!
//! # Example
//!
//! ```no_run
//! use core_auth::oauth::{OAuthConfig, OAuthFlowManager};
//! use core_auth::ProviderKind;
//! use std::sync::Arc;
//!
//! # async fn example() -> core_auth::Result<()> {
//! # use bridge_traits::http::HttpClient;
//! # let http_client: Arc<dyn HttpClient> = todo!();
//! let config = OAuthConfig::from_client_secrets_file(
//!     ProviderKind::YouTube,
//!     "youtube_credentials.json",
//!     &["https://www.googleapis.com/auth/youtube.upload"],
//! )?;
//!
//! let flow = OAuthFlowManager::new(config, http_client);
//! let (auth_url, verifier) = flow.build_auth_url()?;
//! println!("Open {}", auth_url);
//! let tokens = flow.exchange_pasted_response("4/0AX...", &verifier).await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::types::{OAuthTokens, ProviderKind};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest};
use bytes::Bytes;
use rand::Rng;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};
use url::Url;

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Loopback redirect used when the secrets file lists none
const DEFAULT_REDIRECT_URI: &str = "http://localhost";

const REFRESH_MAX_ATTEMPTS: u32 = 3;

/// OAuth 2.0 provider configuration.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub provider: ProviderKind,
    pub client_id: String,
    /// Installed-app clients still receive a secret; it is not confidential
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub auth_url: String,
    pub token_url: String,
}

/// Layout of the JSON file downloaded from the Google Cloud console
#[derive(Debug, Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

#[derive(Debug, Deserialize)]
struct ClientSecrets {
    client_id: String,
    client_secret: Option<String>,
    auth_uri: Option<String>,
    token_uri: Option<String>,
    #[serde(default)]
    redirect_uris: Vec<String>,
}

impl OAuthConfig {
    /// Read a Google client secrets file (`installed` or `web` section)
    pub fn from_client_secrets_file(
        provider: ProviderKind,
        path: impl AsRef<Path>,
        scopes: &[&str],
    ) -> Result<Self> {
        let path = path.as_ref();
        let invalid = |reason: String| AuthError::InvalidClientSecrets {
            path: path.display().to_string(),
            reason,
        };

        let contents = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
        Self::from_client_secrets_json(provider, &contents, scopes).map_err(|e| match e {
            AuthError::InvalidClientSecrets { reason, .. } => invalid(reason),
            other => other,
        })
    }

    /// Parse the contents of a client secrets file
    pub fn from_client_secrets_json(
        provider: ProviderKind,
        json: &str,
        scopes: &[&str],
    ) -> Result<Self> {
        let invalid = |reason: String| AuthError::InvalidClientSecrets {
            path: "<inline>".to_string(),
            reason,
        };

        let file: ClientSecretsFile =
            serde_json::from_str(json).map_err(|e| invalid(e.to_string()))?;
        let secrets = file
            .installed
            .or(file.web)
            .ok_or_else(|| invalid("expected an 'installed' or 'web' section".to_string()))?;

        if secrets.client_id.trim().is_empty() {
            return Err(invalid("client_id is empty".to_string()));
        }

        Ok(Self {
            provider,
            client_id: secrets.client_id,
            client_secret: secrets.client_secret.filter(|s| !s.is_empty()),
            redirect_uri: secrets
                .redirect_uris
                .into_iter()
                .next()
                .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string()),
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
            auth_url: secrets
                .auth_uri
                .unwrap_or_else(|| GOOGLE_AUTH_URL.to_string()),
            token_url: secrets
                .token_uri
                .unwrap_or_else(|| GOOGLE_TOKEN_URL.to_string()),
        })
    }
}

/// PKCE (Proof Key for Code Exchange) verifier.
///
/// The verifier stays in memory for the duration of the authorization flow.
/// Only the challenge derived from it is sent with the authorization URL.
#[derive(Debug, Clone)]
pub struct PkceVerifier {
    verifier: String,
    state: String,
}

impl PkceVerifier {
    /// Generate a 32-byte verifier and a 16-byte state, both base64url
    pub fn new() -> Self {
        let mut rng = rand::thread_rng();

        let mut verifier_bytes = [0u8; 32];
        rng.fill(&mut verifier_bytes);
        let verifier = URL_SAFE_NO_PAD.encode(verifier_bytes);

        let mut state_bytes = [0u8; 16];
        rng.fill(&mut state_bytes);
        let state = URL_SAFE_NO_PAD.encode(state_bytes);

        Self { verifier, state }
    }

    pub fn verifier(&self) -> &str {
        &self.verifier
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    /// S256 challenge: BASE64URL(SHA256(code_verifier))
    pub fn challenge(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.verifier.as_bytes());
        URL_SAFE_NO_PAD.encode(hasher.finalize())
    }
}

impl Default for PkceVerifier {
    fn default() -> Self {
        Self::new()
    }
}

/// What the user pasted back after authorizing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationResponse {
    pub code: String,
    /// Present only when the full redirect URL was pasted
    pub state: Option<String>,
}

impl AuthorizationResponse {
    /// Accept either a bare code or the full redirect URL
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(AuthError::InvalidAuthCode("nothing was pasted".to_string()));
        }

        let Ok(url) = Url::parse(input) else {
            return Ok(Self {
                code: input.to_string(),
                state: None,
            });
        };

        let mut code = None;
        let mut state = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "code" => code = Some(value.into_owned()),
                "state" => state = Some(value.into_owned()),
                "error" => {
                    return Err(AuthError::InvalidAuthCode(format!(
                        "authorization was denied: {}",
                        value
                    )))
                }
                _ => {}
            }
        }

        let code = code.ok_or_else(|| {
            AuthError::InvalidAuthCode("redirect URL does not contain a code".to_string())
        })?;
        Ok(Self { code, state })
    }
}

/// OAuth 2.0 flow manager.
pub struct OAuthFlowManager {
    config: OAuthConfig,
    http_client: Arc<dyn HttpClient>,
    retry_base_delay: Duration,
}

impl OAuthFlowManager {
    pub fn new(config: OAuthConfig, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            config,
            http_client,
            retry_base_delay: Duration::from_millis(100),
        }
    }

    /// Override the backoff base used when refreshing (tests use zero)
    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    pub fn provider(&self) -> ProviderKind {
        self.config.provider
    }

    /// Build the authorization URL with PKCE challenge.
    ///
    /// Requests offline access and forces the consent screen so Google
    /// always returns a refresh token.
    #[instrument(skip(self), fields(provider = %self.config.provider))]
    pub fn build_auth_url(&self) -> Result<(String, PkceVerifier)> {
        let verifier = PkceVerifier::new();
        let challenge = verifier.challenge();

        let mut url = Url::parse(&self.config.auth_url)
            .map_err(|e| AuthError::Other(format!("Invalid auth URL: {}", e)))?;

        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.config.scopes.join(" "))
            .append_pair("state", verifier.state())
            .append_pair("code_challenge", &challenge)
            .append_pair("code_challenge_method", "S256")
            .append_pair("access_type", "offline")
            .append_pair("prompt", "consent");

        debug!("Built authorization URL");
        Ok((url.to_string(), verifier))
    }

    /// Exchange whatever the user pasted (code or redirect URL) for tokens
    pub async fn exchange_pasted_response(
        &self,
        pasted: &str,
        verifier: &PkceVerifier,
    ) -> Result<OAuthTokens> {
        let response = AuthorizationResponse::parse(pasted)?;
        if let Some(state) = &response.state {
            if state != verifier.state() {
                warn!(provider = %self.config.provider, "OAuth state mismatch");
                return Err(AuthError::StateMismatch {
                    expected: verifier.state().to_string(),
                    actual: state.clone(),
                });
            }
        }
        self.exchange_code(&response.code, verifier).await
    }

    /// Exchange an authorization code for OAuth tokens.
    #[instrument(skip(self, code, verifier), fields(provider = %self.config.provider))]
    pub async fn exchange_code(&self, code: &str, verifier: &PkceVerifier) -> Result<OAuthTokens> {
        let mut params = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("code_verifier", verifier.verifier()),
        ];
        if let Some(client_secret) = &self.config.client_secret {
            params.push(("client_secret", client_secret.as_str()));
        }

        let response = self
            .http_client
            .execute(self.token_request(&params)?)
            .await
            .map_err(|e| AuthError::NetworkError(e.to_string()))?;

        if !response.is_success() {
            let error_body = response
                .text()
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            warn!(status = response.status, "Token exchange failed");
            return Err(AuthError::InvalidAuthCode(format!(
                "Token endpoint returned {}: {}",
                response.status, error_body
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .map_err(|e| AuthError::Other(format!("Failed to parse token response: {}", e)))?;

        info!(
            expires_in = token_response.expires_in,
            has_refresh_token = token_response.refresh_token.is_some(),
            "Exchanged authorization code for tokens"
        );

        Ok(OAuthTokens::new(
            token_response.access_token,
            token_response.refresh_token,
            token_response.expires_in,
        ))
    }

    /// Refresh an access token.
    ///
    /// 4xx responses (revoked or invalid refresh token) fail immediately;
    /// 5xx responses are retried up to three times with exponential backoff.
    /// Google omits the refresh token from refresh responses, so the old one
    /// is carried over.
    #[instrument(skip(self, refresh_token), fields(provider = %self.config.provider))]
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<OAuthTokens> {
        let mut params = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.config.client_id.as_str()),
        ];
        if let Some(client_secret) = &self.config.client_secret {
            params.push(("client_secret", client_secret.as_str()));
        }

        let mut attempts = 0;
        loop {
            attempts += 1;

            let response = self
                .http_client
                .execute(self.token_request(&params)?)
                .await
                .map_err(|e| AuthError::TokenRefreshFailed(e.to_string()))?;

            if response.is_success() {
                let token_response: TokenResponse = response.json().map_err(|e| {
                    AuthError::Other(format!("Failed to parse token response: {}", e))
                })?;

                debug!(
                    expires_in = token_response.expires_in,
                    "Refreshed access token"
                );

                return Ok(OAuthTokens::new(
                    token_response.access_token,
                    token_response
                        .refresh_token
                        .or_else(|| Some(refresh_token.to_string())),
                    token_response.expires_in,
                ));
            }

            let status = response.status;
            let error_body = response
                .text()
                .unwrap_or_else(|_| "Unable to read error response".to_string());

            if response.is_client_error() {
                warn!(status, "Token refresh rejected");
                return Err(AuthError::TokenRefreshFailed(format!(
                    "Token endpoint returned {}: {}",
                    status, error_body
                )));
            }

            if attempts >= REFRESH_MAX_ATTEMPTS {
                return Err(AuthError::TokenRefreshFailed(format!(
                    "Token refresh failed after {} attempts. Last error: {} - {}",
                    attempts, status, error_body
                )));
            }

            let delay = self.retry_base_delay * 2u32.pow(attempts - 1);
            warn!(
                status,
                attempts,
                delay_ms = delay.as_millis() as u64,
                "Token refresh failed, retrying"
            );
            sleep(delay).await;
        }
    }

    fn token_request(&self, params: &[(&str, &str)]) -> Result<HttpRequest> {
        let encoded_body = serde_urlencoded::to_string(params)
            .map_err(|e| AuthError::Other(format!("Failed to encode token request: {}", e)))?;

        Ok(
            HttpRequest::new(HttpMethod::Post, self.config.token_url.clone())
                .header("Content-Type", "application/x-www-form-urlencoded")
                .body(Bytes::from(encoded_body)),
        )
    }
}

/// Token endpoint response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}
