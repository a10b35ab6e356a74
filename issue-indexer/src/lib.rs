//! # Issue Indexer
//!
//! Main library for the resilient issue search indexer.
//!
//! This crate provides the entry point and configuration for running the
//! indexer: startup reindexing followed by a periodic drain of the retry
//! queue.

pub mod config;

pub use config::Dependencies;

use thiserror::Error;

/// Errors that can occur during indexer initialization or execution.
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Pipeline error.
    #[error("Indexer error: {0}")]
    IndexerError(#[from] issue_indexer_pipeline::IndexerError),

    /// Search backend error.
    #[error("Search error: {0}")]
    SearchError(#[from] issue_indexer_repository::SearchError),

    /// Storage error.
    #[error("Store error: {0}")]
    StoreError(#[from] issue_indexer_repository::StoreError),
}

impl IndexingError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
