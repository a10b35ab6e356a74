//! Storage error types.

use thiserror::Error;

/// Errors that can occur in the queue store or the issue projection.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open or talk to the database.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// A persisted row could not be mapped into its typed form.
    #[error("Row error: {0}")]
    RowError(String),
}

impl StoreError {
    /// Create a database error.
    pub fn database(msg: impl Into<String>) -> Self {
        Self::DatabaseError(msg.into())
    }

    /// Create a row mapping error.
    pub fn row(msg: impl Into<String>) -> Self {
        Self::RowError(msg.into())
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::DatabaseError(e.to_string())
    }
}
