//! # Core Uploader
//!
//! The Drive to YouTube batch pipeline and its processed-files ledger.
//!
//! [`UploadPipeline`] only depends on the seams in `bridge-traits`
//! (`StorageProvider`, `VideoPublisher`, `RecordNotifier`), so the same code
//! runs against the real providers and against in-memory fakes in tests.
//! [`Ledger`] is the JSON file that makes repeated runs skip work already
//! done.

pub mod error;
pub mod export;
pub mod ledger;
pub mod pipeline;

pub use error::{Result, UploaderError};
pub use ledger::{FailedEntry, Ledger, LedgerEntry, LedgerStatistics};
pub use pipeline::{
    apply_filter, scratch_file_name, PipelineConfig, ProcessOptions, RunSummary, UploadPipeline,
};
