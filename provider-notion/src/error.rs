use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotionError {
    #[error("Notion integration is disabled")]
    Disabled,

    #[error("Notion API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse Notion response: {0}")]
    Parse(String),

    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

pub type Result<T> = std::result::Result<T, NotionError>;
