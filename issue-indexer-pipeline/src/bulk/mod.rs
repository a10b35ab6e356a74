//! Bulk flush engine.
//!
//! Accumulates write operations into bounded batches and executes them
//! against the search backend. A batch is flushed as soon as its operation
//! count or estimated payload size crosses the profile's threshold; the
//! remainder is flushed on `stop()`. No state survives `stop()`.

use std::sync::Arc;

use tracing::{debug, error, warn};

use issue_indexer_repository::SearchBackend;
use issue_indexer_shared::{BulkOp, IndexingResult};

/// Flush thresholds of a batch: maximum operation count and estimated payload
/// bytes.
#[derive(Debug, Clone, Copy)]
pub struct FlushProfile {
    pub max_actions: usize,
    pub max_bytes: usize,
}

/// Built-in size profiles. `Regular` serves incremental and targeted syncs;
/// `Large` serves full-corpus reindexing. They differ only in threshold
/// tuning, not in semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Size {
    Regular,
    Large,
}

impl Size {
    pub fn profile(&self) -> FlushProfile {
        match self {
            Size::Regular => FlushProfile {
                max_actions: 1_000,
                max_bytes: 5 * 1024 * 1024,
            },
            Size::Large => FlushProfile {
                max_actions: 5_000,
                max_bytes: 10 * 1024 * 1024,
            },
        }
    }
}

/// Converts a stream of write operations into correctly-sized bulk calls.
///
/// Construction opens the batch context; `add` accumulates and flushes when a
/// threshold is crossed; `stop` flushes the remainder and returns the merged
/// result. Per-item rejections and whole-batch transport failures are both
/// reported as failed document keys — retry policy is the caller's concern.
pub struct BulkIndexer {
    backend: Arc<dyn SearchBackend>,
    profile: FlushProfile,
    ops: Vec<BulkOp>,
    pending_bytes: usize,
    result: IndexingResult,
}

impl BulkIndexer {
    pub fn new(backend: Arc<dyn SearchBackend>, size: Size) -> Self {
        Self::with_profile(backend, size.profile())
    }

    pub fn with_profile(backend: Arc<dyn SearchBackend>, profile: FlushProfile) -> Self {
        Self {
            backend,
            profile,
            ops: Vec::new(),
            pending_bytes: 0,
            result: IndexingResult::new(),
        }
    }

    /// Queue one write operation, flushing the batch if a threshold is
    /// crossed.
    pub async fn add(&mut self, op: BulkOp) {
        self.pending_bytes += op.estimated_bytes();
        self.ops.push(op);

        if self.ops.len() >= self.profile.max_actions
            || self.pending_bytes >= self.profile.max_bytes
        {
            self.flush().await;
        }
    }

    /// Remove every document of a project with a single routed
    /// delete-by-query, recorded as one operation in the result.
    pub async fn delete_by_project(&mut self, project_uuid: &str) {
        match self.backend.delete_by_project(project_uuid).await {
            Ok(()) => self.result.record_success(),
            Err(e) => {
                error!(project_uuid = %project_uuid, error = %e, "Project deletion failed");
                self.result.record_failure(project_uuid);
            }
        }
    }

    /// Flush the remainder and return the merged result.
    pub async fn stop(mut self) -> IndexingResult {
        self.flush().await;
        self.result
    }

    async fn flush(&mut self) {
        if self.ops.is_empty() {
            return;
        }

        let ops: Vec<BulkOp> = self.ops.drain(..).collect();
        self.pending_bytes = 0;
        debug!(count = ops.len(), "Flushing bulk batch");

        match self.backend.bulk_execute(&ops).await {
            Ok(outcomes) => {
                for outcome in outcomes {
                    if outcome.success {
                        self.result.record_success();
                    } else {
                        warn!(
                            doc_id = %outcome.doc_id,
                            error = outcome.error.as_deref().unwrap_or("unknown"),
                            "Bulk operation rejected"
                        );
                        self.result.record_failure(outcome.doc_id);
                    }
                }
            }
            Err(e) => {
                // The whole call failed; every operation in the batch counts
                // as failed.
                error!(error = %e, count = ops.len(), "Bulk request failed");
                for op in ops {
                    self.result.record_failure(op.doc_id().to_string());
                }
            }
        }
    }
}
