//! Best-effort record keeping
//!
//! Notifier failures must never abort the pipeline, so the notifier seam does
//! not return `Result`. It returns [`BestEffort`], which the caller is free to
//! inspect for logging or to drop.

use async_trait::async_trait;

use crate::media::MediaItem;

/// Outcome of an operation whose failure is tolerated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BestEffort<T> {
    /// The operation ran and produced a value
    Done(T),
    /// The operation was not attempted (feature disabled)
    Skipped,
    /// The operation ran and failed; the message has already been logged
    Failed(String),
}

impl<T> BestEffort<T> {
    pub fn is_done(&self) -> bool {
        matches!(self, BestEffort::Done(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, BestEffort::Failed(_))
    }

    /// Value if the operation succeeded
    pub fn ok(self) -> Option<T> {
        match self {
            BestEffort::Done(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> BestEffort<U> {
        match self {
            BestEffort::Done(value) => BestEffort::Done(f(value)),
            BestEffort::Skipped => BestEffort::Skipped,
            BestEffort::Failed(message) => BestEffort::Failed(message),
        }
    }
}

impl<T, E: std::fmt::Display> From<std::result::Result<T, E>> for BestEffort<T> {
    fn from(result: std::result::Result<T, E>) -> Self {
        match result {
            Ok(value) => BestEffort::Done(value),
            Err(e) => BestEffort::Failed(e.to_string()),
        }
    }
}

/// External record-keeping system (e.g. a Notion database)
#[async_trait]
pub trait RecordNotifier: Send + Sync {
    /// Push the current state of `item`; returns the record/page ID on success
    async fn record(&self, item: &MediaItem) -> BestEffort<String>;
}

/// Notifier used when record keeping is disabled
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait]
impl RecordNotifier for NoopNotifier {
    async fn record(&self, _item: &MediaItem) -> BestEffort<String> {
        BestEffort::Skipped
    }
}
