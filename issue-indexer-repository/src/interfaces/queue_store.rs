//! Retry queue store trait definition.

use async_trait::async_trait;

use issue_indexer_shared::RetryQueueItem;

use crate::errors::StoreError;

/// Persisted retry queue with ordinary table semantics.
///
/// Each call is its own transaction: the engine deletes items one at a time,
/// immediately after the corresponding write is confirmed, so a crash mid-run
/// never loses confirmed progress and never drops unconfirmed work.
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Persist a new pending item. Duplicates are allowed.
    async fn insert(&self, item: &RetryQueueItem) -> Result<(), StoreError>;

    /// Remove an item, identified by its queue-local id.
    async fn delete(&self, item: &RetryQueueItem) -> Result<(), StoreError>;

    /// Read up to `limit` pending items, oldest first.
    async fn select_pending(&self, limit: usize) -> Result<Vec<RetryQueueItem>, StoreError>;
}
