//! Error types for presentation state operations.
//!
//! None of these ever reach the hosting view as a failure: the engine
//! degrades to placeholders and stale notices instead. They exist so the
//! seams (document sources, JSON bridges) can report what went wrong for
//! logging.

use thiserror::Error;

/// Result type for showreel operations.
pub type ShowreelResult<T> = Result<T, ShowreelError>;

/// Errors that can occur in showreel operations.
#[derive(Debug, Error)]
pub enum ShowreelError {
    /// Catalog or snapshot (de)serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The remote config subscription is unavailable.
    #[error(transparent)]
    Sync(#[from] SyncError),
}

/// Failures of a remote document subscription.
///
/// Delivered to [`crate::LiveConfigSync`], which logs and swallows them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// The subscription could not be established.
    #[error("Subscription unavailable: {0}")]
    Unavailable(String),

    /// An established subscription dropped.
    #[error("Subscription dropped: {0}")]
    Dropped(String),

    /// A delivered snapshot could not be parsed.
    #[error("Malformed snapshot: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}
