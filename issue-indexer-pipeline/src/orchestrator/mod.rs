//! Orchestrator for the issue indexer.
//!
//! Public entry points decide which documents are in scope, wire the document
//! source into the bulk flusher, and reconcile every outcome against the
//! durable retry queue: a queue item is removed only once its documents are
//! confirmed written, and failed items stay queued for the next drain.

use std::collections::HashSet;
use std::sync::Arc;

use futures::TryStreamExt;
use tracing::{error, info, instrument, warn};

use issue_indexer_repository::{QueueStore, SearchBackend};
use issue_indexer_shared::{
    BulkOp, Grouping, IndexingResult, ProjectIndexingCause, RetryQueueItem,
};

use crate::bulk::{BulkIndexer, Size};
use crate::errors::IndexerError;
use crate::source::{DocumentSource, DocumentStream};

/// Maximum number of keys deleted in a single bulk call.
const MAX_DELETE_BATCH_SIZE: usize = 1000;

/// Coordinates document resolution, bulk writes, and retry queue
/// reconciliation for the issue index.
///
/// Each method drives one sync to completion before resolving. There is no
/// engine-level mutual exclusion: concurrent callers race, and the backend's
/// per-document last-write-wins ordering is the only guarantee between racing
/// writers of the same document.
pub struct IssueIndexer {
    backend: Arc<dyn SearchBackend>,
    queue: Arc<dyn QueueStore>,
    source: DocumentSource,
}

impl IssueIndexer {
    pub fn new(
        backend: Arc<dyn SearchBackend>,
        queue: Arc<dyn QueueStore>,
        source: DocumentSource,
    ) -> Self {
        Self {
            backend,
            queue,
            source,
        }
    }

    /// Stream every document in the corpus through the bulk flusher.
    ///
    /// Uses the large size profile and does not involve the queue. Bulk
    /// failures are surfaced in the result; the caller decides whether a
    /// partially failed startup is fatal.
    #[instrument(skip(self))]
    pub async fn index_on_startup(&self) -> Result<IndexingResult, IndexerError> {
        let docs = self.source.for_project(None).await?;
        let result = self.index_stream(docs, Size::Large).await?;
        info!(
            total = result.total,
            successes = result.successes,
            "Startup indexing finished"
        );
        Ok(result)
    }

    /// Reindex one project in response to a lifecycle event.
    ///
    /// Only a new analysis changes this index; creation, key updates, and tag
    /// updates are no-ops because the index carries none of that data.
    #[instrument(skip(self))]
    pub async fn index_project(
        &self,
        project_uuid: &str,
        cause: ProjectIndexingCause,
    ) -> Result<IndexingResult, IndexerError> {
        match cause {
            ProjectIndexingCause::Created
            | ProjectIndexingCause::KeyUpdated
            | ProjectIndexingCause::TagsUpdated => Ok(IndexingResult::new()),
            ProjectIndexingCause::NewAnalysis => {
                let docs = self
                    .source
                    .for_project(Some(project_uuid.to_string()))
                    .await?;
                self.index_stream(docs, Size::Regular).await
            }
        }
    }

    /// Index a set of issues now, durably.
    ///
    /// One queue item per key is written before the live write is attempted,
    /// so a crash at any point leaves the keys recoverable by a later drain.
    #[instrument(skip(self, issue_keys), fields(key_count = issue_keys.len()))]
    pub async fn index_issue_keys(
        &self,
        issue_keys: Vec<String>,
    ) -> Result<IndexingResult, IndexerError> {
        let mut items = Vec::with_capacity(issue_keys.len());
        for key in &issue_keys {
            let item = RetryQueueItem::for_issue_key(key.clone());
            self.queue.insert(&item).await?;
            items.push(item);
        }

        Ok(self.reconcile_key_items(items).await)
    }

    /// Write a single whole-project queue item; the sync happens on a later
    /// drain. Fire-and-forget by design.
    pub async fn enqueue_project(&self, project_uuid: &str) -> Result<(), IndexerError> {
        let item = RetryQueueItem::for_project(project_uuid.to_string());
        self.queue.insert(&item).await?;
        Ok(())
    }

    /// Read one page of pending queue items and process it.
    pub async fn drain(&self, limit: usize) -> Result<IndexingResult, IndexerError> {
        let items = self.queue.select_pending(limit).await?;
        Ok(self.index_items(items).await)
    }

    /// Process a batch of queue items of mixed groupings.
    ///
    /// Items whose grouping label is unrecognized can never succeed and are
    /// dead-lettered immediately. All other failures are recovered locally:
    /// the item stays queued and is reported in the result, never thrown.
    #[instrument(skip(self, items), fields(item_count = items.len()))]
    pub async fn index_items(&self, items: Vec<RetryQueueItem>) -> IndexingResult {
        let mut result = IndexingResult::new();
        if items.is_empty() {
            return result;
        }

        let mut key_items = Vec::new();
        let mut project_items = Vec::new();
        for item in items {
            match item.grouping() {
                Some(Grouping::ByKeys) => key_items.push(item),
                Some(Grouping::ByProject) => project_items.push(item),
                None => {
                    error!(
                        id = %item.id,
                        doc_id_type = %item.doc_id_type,
                        "Unsupported queue item grouping; removing row from queue"
                    );
                    if let Err(e) = self.queue.delete(&item).await {
                        warn!(id = %item.id, error = %e, "Failed to dead-letter queue item");
                    }
                }
            }
        }

        if !key_items.is_empty() {
            result.merge(self.reconcile_key_items(key_items).await);
        }
        for item in project_items {
            result.merge(self.reconcile_project_item(item).await);
        }
        result
    }

    /// Remove every indexed document of a project, then force a visibility
    /// refresh.
    #[instrument(skip(self))]
    pub async fn delete_project(&self, project_uuid: &str) -> Result<(), IndexerError> {
        let mut bulk = BulkIndexer::new(Arc::clone(&self.backend), Size::Regular);
        bulk.delete_by_project(project_uuid).await;
        let result = bulk.stop().await;

        self.backend.refresh().await?;

        if !result.is_success() {
            return Err(IndexerError::deletion(format!(
                "Fail to delete some issues of project [{project_uuid}]"
            )));
        }
        Ok(())
    }

    /// Delete explicitly enumerated issues of a project.
    ///
    /// Keys are partitioned into fixed-size batches, one bulk delete per
    /// batch, with a single refresh at the end. A failed batch aborts the
    /// whole call; batches already issued are not rolled back since deletes
    /// are idempotent and the whole call can safely be retried.
    #[instrument(skip(self, issue_keys), fields(key_count = issue_keys.len()))]
    pub async fn delete_by_keys(
        &self,
        project_uuid: &str,
        issue_keys: Vec<String>,
    ) -> Result<(), IndexerError> {
        if issue_keys.is_empty() {
            return Ok(());
        }

        for batch in issue_keys.chunks(MAX_DELETE_BATCH_SIZE) {
            let ops: Vec<BulkOp> = batch
                .iter()
                .map(|key| BulkOp::delete(key.clone(), project_uuid.to_string()))
                .collect();

            let outcomes = self.backend.bulk_execute(&ops).await.map_err(|e| {
                IndexerError::deletion(format!(
                    "Fail to delete some issues of project [{project_uuid}]: {e}"
                ))
            })?;

            if let Some(failed) = outcomes.iter().find(|o| !o.success) {
                return Err(IndexerError::deletion(format!(
                    "Fail to delete some issues of project [{}]: {}",
                    project_uuid,
                    failed.error.as_deref().unwrap_or("operation rejected")
                )));
            }
        }

        self.backend.refresh().await?;
        Ok(())
    }

    /// Drive one document stream through a bulk flusher.
    ///
    /// `Err` means the stream itself failed; operations confirmed before the
    /// failure are already durable in the index, but nothing is reported as
    /// confirmed, so queue reconciliation stays conservative.
    async fn index_stream(
        &self,
        mut docs: DocumentStream,
        size: Size,
    ) -> Result<IndexingResult, IndexerError> {
        let mut bulk = BulkIndexer::new(Arc::clone(&self.backend), size);
        while let Some(doc) = docs.try_next().await? {
            bulk.add(BulkOp::index(doc)).await;
        }
        Ok(bulk.stop().await)
    }

    /// One key-set sync covering a group of key-addressed items, followed by
    /// per-item reconciliation.
    ///
    /// An item whose key yields no row is satisfied vacuously: the issue is
    /// gone from the source of truth, so there is nothing left to index and
    /// the item is removed. Queue deletes are committed item by item, never
    /// batched with unrelated items.
    async fn reconcile_key_items(&self, items: Vec<RetryQueueItem>) -> IndexingResult {
        let keys: Vec<String> = items.iter().map(|item| item.doc_id.clone()).collect();
        let docs = self.source.for_keys(keys);

        match self.index_stream(docs, Size::Regular).await {
            Ok(mut result) => {
                let failed: HashSet<String> = result.failed_doc_ids.iter().cloned().collect();
                for item in items {
                    if failed.contains(&item.doc_id) {
                        result.record_failed_item(item);
                    } else if let Err(e) = self.queue.delete(&item).await {
                        warn!(id = %item.id, error = %e, "Failed to remove synced item from queue");
                        result.record_failed_item(item);
                    }
                }
                result
            }
            Err(e) => {
                warn!(error = %e, "Key-set sync aborted; items stay queued");
                let mut result = IndexingResult::new();
                for item in items {
                    result.record_failure(item.doc_id.clone());
                    result.record_failed_item(item);
                }
                result
            }
        }
    }

    /// One project sync for a single project-scoped item. The item is removed
    /// only when every document of the project was confirmed.
    async fn reconcile_project_item(&self, item: RetryQueueItem) -> IndexingResult {
        let run = match self.source.for_project(Some(item.doc_id.clone())).await {
            Ok(docs) => self.index_stream(docs, Size::Regular).await,
            Err(e) => Err(IndexerError::from(e)),
        };

        match run {
            Ok(mut result) if result.is_success() => {
                if let Err(e) = self.queue.delete(&item).await {
                    warn!(id = %item.id, error = %e, "Failed to remove synced item from queue");
                    result.record_failed_item(item);
                }
                result
            }
            Ok(mut result) => {
                result.record_failed_item(item);
                result
            }
            Err(e) => {
                warn!(
                    project_uuid = %item.doc_id,
                    error = %e,
                    "Project sync aborted; item stays queued"
                );
                let mut result = IndexingResult::new();
                result.record_failure(item.doc_id.clone());
                result.record_failed_item(item);
                result
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use futures::stream::{self, StreamExt};
    use issue_indexer_repository::{
        BulkItemOutcome, IssueRowStream, IssueStore, SearchError, StoreError,
    };
    use issue_indexer_shared::{ComponentScope, IssueDocument, IssueRow};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn row(key: &str, project: &str) -> IssueRow {
        IssueRow {
            key: key.to_string(),
            project_uuid: project.to_string(),
            organization_uuid: "O1".to_string(),
            component_uuid: "C1".to_string(),
            module_uuid_path: "M1".to_string(),
            path: Some("src/App.java".to_string()),
            scope: ComponentScope::File,
            rule_repository: "java".to_string(),
            rule_key: "S1".to_string(),
            language: Some("java".to_string()),
            severity: "MAJOR".to_string(),
            manual_severity: false,
            message: None,
            line: None,
            effort: None,
            gap: None,
            status: "OPEN".to_string(),
            resolution: None,
            checksum: None,
            attributes: None,
            assignee: None,
            author_login: None,
            tags: None,
            issue_type: 1,
            issue_creation_date: 0,
            issue_update_date: 0,
            issue_close_date: None,
            updated_at: 0,
        }
    }

    /// Mock backend that applies bulk operations to an in-memory document
    /// map, rejecting configured doc ids.
    #[derive(Default)]
    struct MockBackend {
        bulk_batches: Mutex<Vec<Vec<BulkOp>>>,
        documents: Mutex<HashMap<String, IssueDocument>>,
        reject_ids: Mutex<HashSet<String>>,
        deleted_projects: Mutex<Vec<String>>,
        refresh_count: AtomicUsize,
        fail_delete_by_query: bool,
    }

    impl MockBackend {
        fn new() -> Self {
            Self::default()
        }

        fn rejecting(ids: &[&str]) -> Self {
            let backend = Self::new();
            *backend.reject_ids.lock().unwrap() =
                ids.iter().map(|s| s.to_string()).collect();
            backend
        }

        fn accept_everything(&self) {
            self.reject_ids.lock().unwrap().clear();
        }

        fn batch_sizes(&self) -> Vec<usize> {
            self.bulk_batches
                .lock()
                .unwrap()
                .iter()
                .map(|batch| batch.len())
                .collect()
        }

        fn indexed_keys(&self) -> Vec<String> {
            let mut keys: Vec<String> =
                self.documents.lock().unwrap().keys().cloned().collect();
            keys.sort();
            keys
        }
    }

    #[async_trait]
    impl SearchBackend for MockBackend {
        async fn bulk_execute(
            &self,
            ops: &[BulkOp],
        ) -> Result<Vec<BulkItemOutcome>, SearchError> {
            self.bulk_batches.lock().unwrap().push(ops.to_vec());
            let reject = self.reject_ids.lock().unwrap().clone();
            let mut documents = self.documents.lock().unwrap();
            Ok(ops
                .iter()
                .map(|op| {
                    if reject.contains(op.doc_id()) {
                        return BulkItemOutcome::rejected(op.doc_id(), "rejected");
                    }
                    match op {
                        BulkOp::Index(doc) => {
                            documents.insert(doc.key.clone(), doc.clone());
                        }
                        BulkOp::DeleteByKey { doc_id, .. } => {
                            documents.remove(doc_id);
                        }
                    }
                    BulkItemOutcome::ok(op.doc_id())
                })
                .collect())
        }

        async fn delete_by_project(&self, project_uuid: &str) -> Result<(), SearchError> {
            if self.fail_delete_by_query {
                return Err(SearchError::delete("connection reset"));
            }
            self.deleted_projects
                .lock()
                .unwrap()
                .push(project_uuid.to_string());
            self.documents
                .lock()
                .unwrap()
                .retain(|_, doc| doc.project_uuid != project_uuid);
            Ok(())
        }

        async fn refresh(&self) -> Result<(), SearchError> {
            self.refresh_count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Mock issue store over a fixed row set, recording project requests.
    struct MockIssueStore {
        rows: Vec<IssueRow>,
        project_requests: Mutex<Vec<Option<String>>>,
    }

    impl MockIssueStore {
        fn new(rows: Vec<IssueRow>) -> Self {
            Self {
                rows,
                project_requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl IssueStore for MockIssueStore {
        async fn stream_for_keys(&self, keys: Vec<String>) -> Result<IssueRowStream, StoreError> {
            let rows: Vec<IssueRow> = self
                .rows
                .iter()
                .filter(|r| keys.contains(&r.key))
                .cloned()
                .collect();
            Ok(stream::iter(rows.into_iter().map(Ok)).boxed())
        }

        async fn stream_for_project(
            &self,
            project_uuid: Option<String>,
        ) -> Result<IssueRowStream, StoreError> {
            self.project_requests
                .lock()
                .unwrap()
                .push(project_uuid.clone());
            let rows: Vec<IssueRow> = self
                .rows
                .iter()
                .filter(|r| {
                    project_uuid
                        .as_deref()
                        .map_or(true, |p| r.project_uuid == p)
                })
                .cloned()
                .collect();
            Ok(stream::iter(rows.into_iter().map(Ok)).boxed())
        }
    }

    /// Mock queue store over a plain vector.
    #[derive(Default)]
    struct MockQueueStore {
        items: Mutex<Vec<RetryQueueItem>>,
    }

    impl MockQueueStore {
        fn new() -> Self {
            Self::default()
        }

        fn pending_doc_ids(&self) -> Vec<String> {
            let mut ids: Vec<String> = self
                .items
                .lock()
                .unwrap()
                .iter()
                .map(|item| item.doc_id.clone())
                .collect();
            ids.sort();
            ids
        }
    }

    #[async_trait]
    impl QueueStore for MockQueueStore {
        async fn insert(&self, item: &RetryQueueItem) -> Result<(), StoreError> {
            self.items.lock().unwrap().push(item.clone());
            Ok(())
        }

        async fn delete(&self, item: &RetryQueueItem) -> Result<(), StoreError> {
            self.items.lock().unwrap().retain(|i| i.id != item.id);
            Ok(())
        }

        async fn select_pending(&self, limit: usize) -> Result<Vec<RetryQueueItem>, StoreError> {
            Ok(self
                .items
                .lock()
                .unwrap()
                .iter()
                .take(limit)
                .cloned()
                .collect())
        }
    }

    fn indexer(
        backend: Arc<MockBackend>,
        queue: Arc<MockQueueStore>,
        rows: Vec<IssueRow>,
    ) -> (IssueIndexer, Arc<MockIssueStore>) {
        let store = Arc::new(MockIssueStore::new(rows));
        let indexer = IssueIndexer::new(
            backend,
            queue,
            DocumentSource::new(store.clone()),
        );
        (indexer, store)
    }

    #[tokio::test]
    async fn test_startup_indexes_whole_corpus() {
        let backend = Arc::new(MockBackend::new());
        let queue = Arc::new(MockQueueStore::new());
        let (indexer, store) = indexer(
            backend.clone(),
            queue,
            vec![row("ISSUE-1", "P1"), row("ISSUE-2", "P2")],
        );

        let result = indexer.index_on_startup().await.unwrap();

        assert_eq!(result.total, 2);
        assert_eq!(result.successes, 2);
        assert_eq!(backend.indexed_keys(), vec!["ISSUE-1", "ISSUE-2"]);
        assert_eq!(*store.project_requests.lock().unwrap(), vec![None]);
    }

    #[tokio::test]
    async fn test_new_analysis_triggers_exactly_one_project_reindex() {
        let backend = Arc::new(MockBackend::new());
        let queue = Arc::new(MockQueueStore::new());
        let (indexer, store) = indexer(
            backend.clone(),
            queue,
            vec![row("ISSUE-1", "P1"), row("ISSUE-2", "P2")],
        );

        let result = indexer
            .index_project("P1", ProjectIndexingCause::NewAnalysis)
            .await
            .unwrap();

        assert_eq!(result.total, 1);
        assert_eq!(
            *store.project_requests.lock().unwrap(),
            vec![Some("P1".to_string())]
        );
        assert_eq!(backend.indexed_keys(), vec!["ISSUE-1"]);
    }

    #[tokio::test]
    async fn test_other_lifecycle_causes_are_no_ops() {
        let backend = Arc::new(MockBackend::new());
        let queue = Arc::new(MockQueueStore::new());
        let (indexer, store) =
            indexer(backend.clone(), queue, vec![row("ISSUE-1", "P1")]);

        for cause in [
            ProjectIndexingCause::Created,
            ProjectIndexingCause::KeyUpdated,
            ProjectIndexingCause::TagsUpdated,
        ] {
            let result = indexer.index_project("P1", cause).await.unwrap();
            assert_eq!(result.total, 0);
        }

        assert!(store.project_requests.lock().unwrap().is_empty());
        assert!(backend.bulk_batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_index_issue_keys_clears_queue_on_success() {
        let backend = Arc::new(MockBackend::new());
        let queue = Arc::new(MockQueueStore::new());
        let (indexer, _) = indexer(
            backend.clone(),
            queue.clone(),
            vec![row("ISSUE-1", "P1"), row("ISSUE-2", "P1")],
        );

        let result = indexer
            .index_issue_keys(vec!["ISSUE-1".to_string(), "ISSUE-2".to_string()])
            .await
            .unwrap();

        assert_eq!(result.total, 2);
        assert!(result.is_success());
        assert!(queue.pending_doc_ids().is_empty());
        assert_eq!(backend.indexed_keys(), vec!["ISSUE-1", "ISSUE-2"]);
    }

    #[tokio::test]
    async fn test_partial_failure_leaves_exactly_the_failed_keys_queued() {
        let backend = Arc::new(MockBackend::rejecting(&["ISSUE-1", "ISSUE-3"]));
        let queue = Arc::new(MockQueueStore::new());
        let keys: Vec<String> = (0..5).map(|i| format!("ISSUE-{i}")).collect();
        let rows = keys.iter().map(|k| row(k, "P1")).collect();
        let (indexer, _) = indexer(backend, queue.clone(), rows);

        let result = indexer.index_issue_keys(keys).await.unwrap();

        assert_eq!(result.total, 5);
        assert_eq!(result.successes, 3);
        assert_eq!(queue.pending_doc_ids(), vec!["ISSUE-1", "ISSUE-3"]);
        assert_eq!(result.failed_items.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_rows_are_vacuously_satisfied() {
        let backend = Arc::new(MockBackend::new());
        let queue = Arc::new(MockQueueStore::new());
        let (indexer, _) =
            indexer(backend.clone(), queue.clone(), vec![row("ISSUE-1", "P1")]);

        let result = indexer
            .index_issue_keys(vec!["ISSUE-1".to_string(), "ISSUE-GONE".to_string()])
            .await
            .unwrap();

        assert_eq!(result.total, 1);
        assert!(result.is_success());
        assert!(queue.pending_doc_ids().is_empty());
    }

    #[tokio::test]
    async fn test_queue_converges_once_backend_accepts() {
        let backend = Arc::new(MockBackend::rejecting(&["ISSUE-1", "ISSUE-2"]));
        let queue = Arc::new(MockQueueStore::new());
        let (indexer, _) = indexer(
            backend.clone(),
            queue.clone(),
            vec![row("ISSUE-1", "P1"), row("ISSUE-2", "P1")],
        );

        let result = indexer
            .index_issue_keys(vec!["ISSUE-1".to_string(), "ISSUE-2".to_string()])
            .await
            .unwrap();
        assert_eq!(result.failures(), 2);
        assert_eq!(queue.pending_doc_ids(), vec!["ISSUE-1", "ISSUE-2"]);

        backend.accept_everything();
        let result = indexer.drain(10).await.unwrap();
        assert!(result.is_success());
        assert!(queue.pending_doc_ids().is_empty());
        assert_eq!(backend.indexed_keys(), vec!["ISSUE-1", "ISSUE-2"]);
    }

    #[tokio::test]
    async fn test_indexing_twice_is_idempotent() {
        let backend = Arc::new(MockBackend::new());
        let queue = Arc::new(MockQueueStore::new());
        let (indexer, _) =
            indexer(backend.clone(), queue, vec![row("ISSUE-1", "P1")]);

        indexer
            .index_issue_keys(vec!["ISSUE-1".to_string()])
            .await
            .unwrap();
        let after_first = backend.documents.lock().unwrap().clone();

        indexer
            .index_issue_keys(vec!["ISSUE-1".to_string()])
            .await
            .unwrap();
        let after_second = backend.documents.lock().unwrap().clone();

        assert_eq!(after_first.len(), 1);
        assert_eq!(after_first.get("ISSUE-1"), after_second.get("ISSUE-1"));
    }

    #[tokio::test]
    async fn test_project_item_is_removed_after_successful_sync() {
        let backend = Arc::new(MockBackend::new());
        let queue = Arc::new(MockQueueStore::new());
        let (indexer, _) = indexer(
            backend.clone(),
            queue.clone(),
            vec![row("ISSUE-1", "P1"), row("ISSUE-2", "P1"), row("ISSUE-3", "P2")],
        );

        let item = RetryQueueItem::for_project("P1");
        queue.insert(&item).await.unwrap();

        let result = indexer.index_items(vec![item]).await;

        assert_eq!(result.total, 2);
        assert!(result.is_success());
        assert!(queue.pending_doc_ids().is_empty());
        assert_eq!(backend.indexed_keys(), vec!["ISSUE-1", "ISSUE-2"]);
    }

    #[tokio::test]
    async fn test_project_item_stays_queued_when_any_document_fails() {
        let backend = Arc::new(MockBackend::rejecting(&["ISSUE-2"]));
        let queue = Arc::new(MockQueueStore::new());
        let (indexer, _) = indexer(
            backend,
            queue.clone(),
            vec![row("ISSUE-1", "P1"), row("ISSUE-2", "P1")],
        );

        let item = RetryQueueItem::for_project("P1");
        queue.insert(&item).await.unwrap();

        let result = indexer.index_items(vec![item]).await;

        assert_eq!(result.failures(), 1);
        assert_eq!(queue.pending_doc_ids(), vec!["P1"]);
        assert_eq!(result.failed_items.len(), 1);
    }

    #[tokio::test]
    async fn test_unrecognized_grouping_is_dead_lettered() {
        let backend = Arc::new(MockBackend::new());
        let queue = Arc::new(MockQueueStore::new());
        let (indexer, _) = indexer(backend.clone(), queue.clone(), Vec::new());

        let mut item = RetryQueueItem::for_issue_key("ISSUE-1");
        item.doc_id_type = "legacyLabel".to_string();
        queue.insert(&item).await.unwrap();

        let result = indexer.index_items(vec![item]).await;

        assert_eq!(result.total, 0);
        assert!(queue.pending_doc_ids().is_empty());
        assert!(backend.bulk_batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_drain_handles_mixed_groupings() {
        let backend = Arc::new(MockBackend::new());
        let queue = Arc::new(MockQueueStore::new());
        let (indexer, _) = indexer(
            backend.clone(),
            queue.clone(),
            vec![row("ISSUE-1", "P1"), row("ISSUE-2", "P2")],
        );

        queue
            .insert(&RetryQueueItem::for_issue_key("ISSUE-1"))
            .await
            .unwrap();
        queue.insert(&RetryQueueItem::for_project("P2")).await.unwrap();
        let mut dead = RetryQueueItem::for_issue_key("ISSUE-1");
        dead.doc_id_type = "legacyLabel".to_string();
        queue.insert(&dead).await.unwrap();

        let result = indexer.drain(10).await.unwrap();

        assert_eq!(result.total, 2);
        assert!(result.is_success());
        assert!(queue.pending_doc_ids().is_empty());
        assert_eq!(backend.indexed_keys(), vec!["ISSUE-1", "ISSUE-2"]);
    }

    #[tokio::test]
    async fn test_enqueue_project_does_not_sync() {
        let backend = Arc::new(MockBackend::new());
        let queue = Arc::new(MockQueueStore::new());
        let (indexer, _) = indexer(backend.clone(), queue.clone(), Vec::new());

        indexer.enqueue_project("P1").await.unwrap();

        let pending = queue.items.lock().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].grouping(), Some(Grouping::ByProject));
        assert!(backend.bulk_batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_project_issues_routed_query_and_refreshes() {
        let backend = Arc::new(MockBackend::new());
        let queue = Arc::new(MockQueueStore::new());
        let (indexer, _) =
            indexer(backend.clone(), queue, vec![row("ISSUE-1", "P1")]);

        indexer.index_on_startup().await.unwrap();
        indexer.delete_project("P1").await.unwrap();

        assert_eq!(*backend.deleted_projects.lock().unwrap(), vec!["P1"]);
        assert_eq!(backend.refresh_count.load(Ordering::SeqCst), 1);
        assert!(backend.indexed_keys().is_empty());
    }

    #[tokio::test]
    async fn test_delete_project_surfaces_backend_error() {
        let backend = Arc::new(MockBackend {
            fail_delete_by_query: true,
            ..MockBackend::new()
        });
        let queue = Arc::new(MockQueueStore::new());
        let (indexer, _) = indexer(backend.clone(), queue, Vec::new());

        let err = indexer.delete_project("P1").await.unwrap_err();

        assert!(err.to_string().contains("P1"));
        assert_eq!(backend.refresh_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_delete_by_keys_batches_and_refreshes_once() {
        let backend = Arc::new(MockBackend::new());
        let queue = Arc::new(MockQueueStore::new());
        let (indexer, _) = indexer(backend.clone(), queue, Vec::new());

        let keys: Vec<String> = (0..2500).map(|i| format!("ISSUE-{i}")).collect();
        indexer.delete_by_keys("P1", keys).await.unwrap();

        assert_eq!(backend.batch_sizes(), vec![1000, 1000, 500]);
        assert_eq!(backend.refresh_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_delete_by_keys_with_no_keys_is_a_no_op() {
        let backend = Arc::new(MockBackend::new());
        let queue = Arc::new(MockQueueStore::new());
        let (indexer, _) = indexer(backend.clone(), queue, Vec::new());

        indexer.delete_by_keys("P1", Vec::new()).await.unwrap();

        assert!(backend.bulk_batches.lock().unwrap().is_empty());
        assert_eq!(backend.refresh_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_delete_by_keys_aborts_on_batch_failure() {
        let backend = Arc::new(MockBackend::rejecting(&["ISSUE-1500"]));
        let queue = Arc::new(MockQueueStore::new());
        let (indexer, _) = indexer(backend.clone(), queue, Vec::new());

        let keys: Vec<String> = (0..2500).map(|i| format!("ISSUE-{i}")).collect();
        let err = indexer.delete_by_keys("P1", keys).await.unwrap_err();

        assert!(err.to_string().contains("project [P1]"));
        // The failing second batch aborts the call before the third batch and
        // the refresh.
        assert_eq!(backend.batch_sizes(), vec![1000, 1000]);
        assert_eq!(backend.refresh_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_routing_follows_the_project() {
        let backend = Arc::new(MockBackend::new());
        let queue = Arc::new(MockQueueStore::new());
        let (indexer, _) =
            indexer(backend.clone(), queue, vec![row("ISSUE-1", "P7")]);

        indexer
            .index_issue_keys(vec!["ISSUE-1".to_string()])
            .await
            .unwrap();

        let batches = backend.bulk_batches.lock().unwrap();
        assert_eq!(batches[0][0].routing(), "P7");
    }
}
