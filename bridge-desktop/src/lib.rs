//! # Desktop Bridge Implementations
//!
//! Default implementations of the host bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! - `HttpClient` using `reqwest` with rustls
//! - `SecureStore` using the `keyring` crate (behind `secure-store`)
//!
//! ## Feature Flags
//!
//! - `secure-store`: Enable OS keychain integration for OAuth tokens
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use bridge_desktop::ReqwestHttpClient;
//! use bridge_traits::HttpClient;
//!
//! let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new()?);
//! ```

mod http;

#[cfg(feature = "secure-store")]
mod secure_store;

pub use http::ReqwestHttpClient;

#[cfg(feature = "secure-store")]
pub use secure_store::KeyringSecureStore;
