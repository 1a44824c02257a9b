use bridge_traits::BridgeError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UploaderError {
    #[error("No Google Drive folder configured (set GDRIVE_FOLDER_ID or pass --folder)")]
    MissingFolder,

    #[error("Failed to list folder {folder_id}: {source}")]
    Listing {
        folder_id: String,
        source: BridgeError,
    },

    #[error("Failed to read ledger {}: {source}", path.display())]
    LedgerRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write ledger {}: {source}", path.display())]
    LedgerWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to encode ledger: {0}")]
    LedgerEncode(#[from] serde_json::Error),

    #[error("Failed to export ledger to {}: {source}", path.display())]
    Export {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, UploaderError>;
