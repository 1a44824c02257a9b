//! Error types for the YouTube provider

use bridge_traits::error::BridgeError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum YouTubeError {
    #[error("YouTube authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Non-retryable API response
    #[error("YouTube API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Server errors persisted past the retry budget
    #[error("Upload failed after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    #[error("Local file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Upload session expired or was not found")]
    SessionExpired,

    #[error("Upload session response did not include a Location header")]
    MissingSessionUri,

    #[error("Video {0} not found")]
    VideoNotFound(String),

    #[error("Failed to parse YouTube response: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

pub type Result<T> = std::result::Result<T, YouTubeError>;

impl From<YouTubeError> for BridgeError {
    fn from(error: YouTubeError) -> Self {
        match error {
            YouTubeError::Bridge(e) => e,
            other => BridgeError::OperationFailed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retries_exhausted_message() {
        let error = YouTubeError::RetriesExhausted {
            attempts: 4,
            last_error: "HTTP 503: backendError".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Upload failed after 4 attempts: HTTP 503: backendError"
        );
    }

    #[test]
    fn test_file_not_found_message() {
        let error = YouTubeError::FileNotFound(PathBuf::from("/tmp/x.mp4"));
        let bridged: BridgeError = error.into();
        assert!(bridged.to_string().contains("/tmp/x.mp4"));
    }
}
