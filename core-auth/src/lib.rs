//! # Authentication Module
//!
//! OAuth 2.0 credentials for the Google APIs the uploader talks to.
//!
//! ## Overview
//!
//! Drive and YouTube are authorized separately, each with its own OAuth
//! client secrets file and its own persisted token set. The flow is:
//!
//! 1. [`OAuthConfig::from_client_secrets_file`] reads the client ID/secret
//!    downloaded from the Google Cloud console.
//! 2. [`OAuthFlowManager::build_auth_url`] produces a PKCE authorization URL
//!    the user opens in a browser.
//! 3. The code (or the whole redirect URL) the user pastes back is exchanged
//!    for tokens, which a [`TokenStore`] persists.
//! 4. At run time [`CredentialManager`] hands out access tokens, refreshing
//!    and re-persisting them when they are about to expire.
//!
//! ## Features
//!
//! - Authorization code flow with PKCE (S256)
//! - Automatic refresh five minutes before expiry
//! - JSON token files (owner-only permissions on Unix) or the OS keychain

pub mod error;
pub mod manager;
pub mod oauth;
pub mod token_store;
pub mod types;

pub use error::{AuthError, Result};
pub use manager::CredentialManager;
pub use oauth::{OAuthConfig, OAuthFlowManager, PkceVerifier};
pub use token_store::{FileTokenStore, SecureTokenStore, TokenStore};
pub use types::{OAuthTokens, ProviderKind};
