//! # Issue Indexer Repository
//!
//! This crate provides the traits the indexing engine is wired against — the
//! bulk search backend, the retry queue store, and the issue projection — plus
//! concrete implementations for OpenSearch and SQLite. Error types live here
//! so that every backend reports through the same two enums.

pub mod errors;
pub mod interfaces;
pub mod opensearch;
pub mod sqlite;
pub mod types;

pub use crate::errors::{SearchError, StoreError};
pub use crate::interfaces::{IssueRowStream, IssueStore, QueueStore, SearchBackend};
pub use crate::opensearch::{IndexConfig, OpenSearchBackend};
pub use crate::sqlite::{SqliteIssueStore, SqliteQueueStore};
pub use crate::types::BulkItemOutcome;
