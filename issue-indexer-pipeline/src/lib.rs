//! # Issue Indexer Pipeline
//!
//! This crate provides the core of the resilient indexing engine:
//!
//! 1. **Document source**: streams index-ready documents out of the issue
//!    projection, page by page
//! 2. **Bulk flusher**: batches write operations and executes bounded bulk
//!    calls against the search backend
//! 3. **Orchestrator**: decides what to (re)index or delete, and reconciles
//!    outcomes against the durable retry queue

pub mod bulk;
pub mod errors;
pub mod orchestrator;
pub mod source;

pub use bulk::{BulkIndexer, FlushProfile, Size};
pub use errors::IndexerError;
pub use orchestrator::IssueIndexer;
pub use source::{DocumentSource, DocumentStream};
