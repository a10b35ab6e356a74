//! Document source for the issue indexer.
//!
//! Streams index-ready issue documents out of the backing issue projection.
//! Large key sets are chunked into bounded pages before they reach the store;
//! consumers only ever see one aggregated, lazy sequence. Dropping the stream
//! releases the underlying cursor on every exit path.

use std::sync::Arc;

use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};

use issue_indexer_repository::{IssueStore, StoreError};
use issue_indexer_shared::IssueDocument;

/// Number of keys handed to the issue store in a single page.
const KEY_PAGE_SIZE: usize = 500;

/// A finite, lazy sequence of index-ready documents.
pub type DocumentStream = BoxStream<'static, Result<IssueDocument, StoreError>>;

/// Streams documents for a bounded key set or for a project scope.
#[derive(Clone)]
pub struct DocumentSource {
    store: Arc<dyn IssueStore>,
}

impl DocumentSource {
    pub fn new(store: Arc<dyn IssueStore>) -> Self {
        Self { store }
    }

    /// Stream the documents for a set of issue keys.
    ///
    /// The key set is chunked into pages of [`KEY_PAGE_SIZE`]; each page is
    /// resolved lazily as the stream is consumed. Missing keys simply yield
    /// no document.
    pub fn for_keys(&self, keys: Vec<String>) -> DocumentStream {
        let store = Arc::clone(&self.store);
        let pages: Vec<Vec<String>> = keys
            .chunks(KEY_PAGE_SIZE)
            .map(|page| page.to_vec())
            .collect();

        stream::iter(pages.into_iter().map(Ok::<_, StoreError>))
            .and_then(move |page| {
                let store = Arc::clone(&store);
                async move { store.stream_for_keys(page).await }
            })
            .try_flatten()
            .map_ok(IssueDocument::from)
            .boxed()
    }

    /// Stream the documents of one project, or of the whole corpus when
    /// `project_uuid` is `None`.
    pub async fn for_project(
        &self,
        project_uuid: Option<String>,
    ) -> Result<DocumentStream, StoreError> {
        let rows = self.store.stream_for_project(project_uuid).await?;
        Ok(rows.map_ok(IssueDocument::from).boxed())
    }
}
