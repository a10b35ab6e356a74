//! Bulk write backend trait definition.

use async_trait::async_trait;

use issue_indexer_shared::BulkOp;

use crate::errors::SearchError;
use crate::types::BulkItemOutcome;

/// Abstracts the bulk write surface of the search engine.
///
/// Implementations are injected into the bulk flush engine; tests use mocks,
/// production uses [`crate::OpenSearchBackend`].
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Execute a batch of index/delete operations in one bulk call.
    ///
    /// Returns one outcome per operation, in request order. `Err` means the
    /// call failed as a whole (transport, auth); the caller must then treat
    /// every operation in the batch as failed.
    async fn bulk_execute(&self, ops: &[BulkOp]) -> Result<Vec<BulkItemOutcome>, SearchError>;

    /// Delete every document of a project with a routed delete-by-query.
    async fn delete_by_project(&self, project_uuid: &str) -> Result<(), SearchError>;

    /// Make prior writes visible to subsequent reads.
    async fn refresh(&self) -> Result<(), SearchError>;
}
