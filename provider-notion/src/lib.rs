//! # Notion Provider
//!
//! Best-effort record keeping of upload outcomes in a Notion database.
//!
//! Each processed file gets one page, keyed by its Google Drive ID. The
//! notifier looks the page up first and patches it, so a retried file
//! updates its existing row instead of adding a second one.
//!
//! The database must define these properties:
//!
//! | Property | Type |
//! |----------|------|
//! | Title | title |
//! | Status | select |
//! | File Size | number |
//! | Google Drive Link | url |
//! | YouTube URL | url |
//! | YouTube ID | rich text |
//! | Google Drive ID | rich text |
//! | Upload Date | date |
//! | Error Message | rich text |

pub mod error;
pub mod notifier;
pub mod properties;
pub mod types;

pub use error::{NotionError, Result};
pub use notifier::{NotionConfig, NotionNotifier};
pub use properties::build_properties;
