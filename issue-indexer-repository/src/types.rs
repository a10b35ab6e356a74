//! Result types shared by backend implementations.

/// Outcome of one operation inside a bulk call.
///
/// A rejected item means the batch as a whole was accepted but this operation
/// was refused by the backend; transport-level failures are reported as an
/// error on the whole call instead.
#[derive(Debug, Clone)]
pub struct BulkItemOutcome {
    /// The document key the operation addressed.
    pub doc_id: String,
    /// Whether the backend confirmed the operation.
    pub success: bool,
    /// Backend-reported reason when the operation was rejected.
    pub error: Option<String>,
}

impl BulkItemOutcome {
    pub fn ok(doc_id: impl Into<String>) -> Self {
        Self {
            doc_id: doc_id.into(),
            success: true,
            error: None,
        }
    }

    pub fn rejected(doc_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            doc_id: doc_id.into(),
            success: false,
            error: Some(error.into()),
        }
    }
}
