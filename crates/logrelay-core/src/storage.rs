//! Storage gateway seam.
//!
//! The actual backend write path lives outside this workspace; consumers
//! only see an opaque fallible apply operation with a typed failure
//! classification.

use async_trait::async_trait;
use thiserror::Error;

use crate::event::{LogBatchEvent, LogEvent, LogStatusEvent};

/// Failure classification for a storage apply attempt.
#[derive(Debug, Error)]
pub enum ApplyError {
    /// The write target index did not exist or failed to initialize.
    /// Recoverable by routing to a different storage node.
    #[error("failed to create index {index}")]
    IndexCreation { index: String },

    /// Any other backend failure, treated uniformly as transient.
    #[error("backend error: {0}")]
    Backend(String),
}

pub type ApplyResult = std::result::Result<(), ApplyError>;

/// Applies build log events to the search/storage backend.
///
/// An event carrying a `target_store` is applied against that node;
/// otherwise the gateway writes to its currently active node.
///
/// Redelivery can apply the same logical event more than once, so
/// implementations must tolerate duplicate application of the same log
/// lines (append-only, at-most-cosmetic duplication).
#[async_trait]
pub trait StorageGateway: Send + Sync {
    /// Persist a single log event.
    async fn apply_log_event(&self, event: &LogEvent) -> ApplyResult;

    /// Persist a batched log event.
    async fn apply_log_batch_event(&self, event: &LogBatchEvent) -> ApplyResult;

    /// Persist a log status event.
    async fn apply_log_status_event(&self, event: &LogStatusEvent) -> ApplyResult;
}
