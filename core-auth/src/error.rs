use bridge_traits::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("{provider} authentication failed: {reason}")]
    AuthenticationFailed { provider: String, reason: String },

    #[error("{provider} is not authorized yet. Run with --setup to authorize")]
    NotAuthenticated { provider: String },

    #[error("No refresh token stored for {provider}. Run with --setup to re-authorize")]
    NoRefreshToken { provider: String },

    #[error("Token refresh failed: {0}")]
    TokenRefreshFailed(String),

    #[error("Invalid OAuth client secrets file {path}: {reason}")]
    InvalidClientSecrets { path: String, reason: String },

    #[error("OAuth state mismatch: expected {expected}, got {actual}")]
    StateMismatch { expected: String, actual: String },

    #[error("Invalid authorization code: {0}")]
    InvalidAuthCode(String),

    #[error("Secure storage unavailable: {0}")]
    SecureStorageUnavailable(String),

    #[error("Token serialization failed: {0}")]
    SerializationFailed(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl From<AuthError> for BridgeError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::NotAuthenticated { .. } | AuthError::NoRefreshToken { .. } => {
                BridgeError::NotAvailable(error.to_string())
            }
            other => BridgeError::OperationFailed(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
