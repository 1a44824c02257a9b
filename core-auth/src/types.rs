use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Google APIs that hold their own authorization.
///
/// # Examples
///
/// ```
/// use core_auth::ProviderKind;
///
/// assert_eq!(ProviderKind::YouTube.display_name(), "YouTube");
/// assert_eq!(ProviderKind::GoogleDrive.as_str(), "google_drive");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    /// Google Drive (read-only source)
    GoogleDrive,
    /// YouTube Data API (upload destination)
    YouTube,
}

impl ProviderKind {
    /// Human-readable display name
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::GoogleDrive => "Google Drive",
            ProviderKind::YouTube => "YouTube",
        }
    }

    /// Identifier used for storage keys and logging
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::GoogleDrive => "google_drive",
            ProviderKind::YouTube => "youtube",
        }
    }

    /// Parse a provider from its identifier
    ///
    /// ```
    /// use core_auth::ProviderKind;
    ///
    /// assert_eq!(ProviderKind::parse("YouTube"), Some(ProviderKind::YouTube));
    /// assert_eq!(ProviderKind::parse("dropbox"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "google_drive" | "googledrive" | "gdrive" => Some(ProviderKind::GoogleDrive),
            "youtube" => Some(ProviderKind::YouTube),
            _ => None,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Number of seconds before expiry at which a token counts as expired
pub const DEFAULT_EXPIRY_BUFFER_SECS: i64 = 300;

/// OAuth 2.0 token set.
///
/// # Security
///
/// Tokens are never logged. The `Debug` implementation redacts them.
///
/// # Examples
///
/// ```
/// use core_auth::OAuthTokens;
///
/// let tokens = OAuthTokens::new("ya29.a0", Some("1//0g".to_string()), 3600);
/// assert!(!tokens.is_expired());
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthTokens {
    /// The access token used for API requests
    pub access_token: String,
    /// Long-lived token used to obtain new access tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// When the access token expires (UTC)
    pub expires_at: DateTime<Utc>,
}

impl OAuthTokens {
    /// Create a token set expiring `expires_in` seconds from now
    pub fn new(access_token: String, refresh_token: Option<String>, expires_in: i64) -> Self {
        Self::issued_at(access_token, refresh_token, expires_in, Utc::now())
    }

    /// Create a token set expiring `expires_in` seconds after `issued_at`
    pub fn issued_at(
        access_token: String,
        refresh_token: Option<String>,
        expires_in: i64,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_at: issued_at + Duration::seconds(expires_in),
        }
    }

    /// Expired, or expiring within the default five minute buffer
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now(), DEFAULT_EXPIRY_BUFFER_SECS)
    }

    /// Expired as of `now`, counting `buffer_seconds` of headroom
    pub fn is_expired_at(&self, now: DateTime<Utc>, buffer_seconds: i64) -> bool {
        now >= self.expires_at - Duration::seconds(buffer_seconds)
    }

    pub fn has_refresh_token(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

impl fmt::Debug for OAuthTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthTokens")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
