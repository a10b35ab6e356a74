//! # Issue Indexer Shared
//!
//! Shared types and data structures for the issue indexer system.
//!
//! This crate holds the plain data model passed between the storage
//! projections, the bulk flush engine, and the orchestrator: raw issue rows
//! and their index-ready document form, retry queue items, bulk write
//! operations, and the mergeable indexing result.

pub mod document;
pub mod lifecycle;
pub mod operation;
pub mod queue;
pub mod result;

pub use document::{ComponentScope, IssueDocument, IssueRow};
pub use lifecycle::ProjectIndexingCause;
pub use operation::BulkOp;
pub use queue::{EntityType, Grouping, RetryQueueItem};
pub use result::IndexingResult;
