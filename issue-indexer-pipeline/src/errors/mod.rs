//! Error types for the issue indexer pipeline.

use thiserror::Error;

use issue_indexer_repository::{SearchError, StoreError};

/// Errors surfaced by the orchestrator's non-queue entry points.
///
/// Queue-triggered syncs never return these: the queue itself is the recovery
/// mechanism, so their failures are logged and left for the next drain.
#[derive(Error, Debug)]
pub enum IndexerError {
    /// Search backend error.
    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    /// Queue or projection storage error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// An explicit deletion call could not complete.
    #[error("Deletion error: {0}")]
    Deletion(String),
}

impl IndexerError {
    /// Create a deletion error.
    pub fn deletion(msg: impl Into<String>) -> Self {
        Self::Deletion(msg.into())
    }
}
