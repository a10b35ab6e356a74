//! Bulk write operations.

use crate::document::IssueDocument;

/// Fallback size estimate for operations whose payload cannot be measured.
const DELETE_OP_BYTES: usize = 64;

/// One pending write against the search index: an index-upsert carrying the
/// full document, or a delete addressed by document key. Both carry the
/// project identifier as routing key for partitioned placement.
#[derive(Debug, Clone, PartialEq)]
pub enum BulkOp {
    Index(IssueDocument),
    DeleteByKey { doc_id: String, routing: String },
}

impl BulkOp {
    pub fn index(document: IssueDocument) -> Self {
        BulkOp::Index(document)
    }

    pub fn delete(doc_id: impl Into<String>, routing: impl Into<String>) -> Self {
        BulkOp::DeleteByKey {
            doc_id: doc_id.into(),
            routing: routing.into(),
        }
    }

    /// The document key this operation addresses.
    pub fn doc_id(&self) -> &str {
        match self {
            BulkOp::Index(doc) => &doc.key,
            BulkOp::DeleteByKey { doc_id, .. } => doc_id,
        }
    }

    /// The routing key used for partitioned placement.
    pub fn routing(&self) -> &str {
        match self {
            BulkOp::Index(doc) => &doc.project_uuid,
            BulkOp::DeleteByKey { routing, .. } => routing,
        }
    }

    /// Estimated payload size, used by the byte-budget flush trigger.
    pub fn estimated_bytes(&self) -> usize {
        match self {
            BulkOp::Index(doc) => serde_json::to_vec(doc)
                .map(|body| body.len())
                .unwrap_or(DELETE_OP_BYTES),
            BulkOp::DeleteByKey { .. } => DELETE_OP_BYTES,
        }
    }
}
