//! Error types for Google Drive provider

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Google Drive provider errors
#[derive(Error, Debug)]
pub enum GoogleDriveError {
    /// Could not obtain a bearer token
    #[error("Google Drive authentication failed: {0}")]
    AuthenticationFailed(String),

    /// API request returned an error
    #[error("Google Drive API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    /// File not found (or not visible to the authorized account)
    #[error("File not found: {file_id}")]
    FileNotFound { file_id: String },

    /// Failed to parse API response
    #[error("Failed to parse Google Drive response: {0}")]
    ParseError(String),

    /// Server returned fewer bytes than the file size
    #[error("Download of {file_id} ended at byte {received} of {expected}")]
    IncompleteDownload {
        file_id: String,
        received: u64,
        expected: u64,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport failure below the API
    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

/// Result type for Google Drive operations
pub type Result<T> = std::result::Result<T, GoogleDriveError>;

impl From<GoogleDriveError> for BridgeError {
    fn from(error: GoogleDriveError) -> Self {
        match error {
            GoogleDriveError::Bridge(e) => e,
            GoogleDriveError::Io(e) => BridgeError::Io(e),
            other => BridgeError::OperationFailed(other.to_string()),
        }
    }
}
