//! Issue projection trait definition.

use async_trait::async_trait;
use futures::stream::BoxStream;

use issue_indexer_shared::IssueRow;

use crate::errors::StoreError;

/// A finite, lazy sequence of issue rows. The underlying cursor is released
/// when the stream is dropped, on every exit path.
pub type IssueRowStream = BoxStream<'static, Result<IssueRow, StoreError>>;

/// Streams index-ready issue projections out of relational storage.
///
/// Both methods tolerate missing rows: the stream may yield fewer rows than
/// keys requested, and requesting an unknown project yields an empty stream.
#[async_trait]
pub trait IssueStore: Send + Sync {
    /// Stream the rows for one bounded page of issue keys.
    async fn stream_for_keys(&self, keys: Vec<String>) -> Result<IssueRowStream, StoreError>;

    /// Stream the rows of one project, or of the whole corpus when
    /// `project_uuid` is `None`. Scan order is whatever the storage yields.
    async fn stream_for_project(
        &self,
        project_uuid: Option<String>,
    ) -> Result<IssueRowStream, StoreError>;
}
