//! Access token seam
//!
//! Providers never see refresh tokens or client secrets. They ask an
//! [`AccessTokenProvider`] for a currently-valid bearer token before each
//! request and the provider is responsible for refreshing behind the scenes.

use async_trait::async_trait;

use crate::error::Result;

/// Supplies a valid OAuth access token on demand
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Return a bearer token that is valid for at least the next few minutes
    async fn access_token(&self) -> Result<String>;
}

/// Fixed token, used for API keys and in tests
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl AccessTokenProvider for StaticToken {
    async fn access_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_token() {
        let provider = StaticToken::new("abc");
        assert_eq!(provider.access_token().await.unwrap(), "abc");
    }
}
