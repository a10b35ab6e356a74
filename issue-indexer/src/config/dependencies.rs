//! Dependency initialization and wiring for the issue indexer.

use std::env;
use std::sync::Arc;
use tracing::info;

use crate::IndexingError;
use issue_indexer_pipeline::{DocumentSource, IssueIndexer};
use issue_indexer_repository::{
    IndexConfig, OpenSearchBackend, SqliteIssueStore, SqliteQueueStore,
};

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default SQLite database path (issues table and retry queue).
const DEFAULT_DATABASE_PATH: &str = "issue-indexer.db";

/// Default seconds between queue drains.
const DEFAULT_DRAIN_INTERVAL_SECS: u64 = 30;

/// Default number of queue items processed per drain.
const DEFAULT_DRAIN_BATCH_SIZE: usize = 100;

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured indexer ready to run.
    pub indexer: IssueIndexer,
    /// Seconds between queue drains.
    pub drain_interval_secs: u64,
    /// Number of queue items processed per drain.
    pub drain_batch_size: usize,
}

impl Dependencies {
    /// Initialize all dependencies from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `ISSUE_INDEX`: name of the issue index (default: issues)
    /// - `DATABASE_PATH`: SQLite database file (default: issue-indexer.db)
    /// - `DRAIN_INTERVAL_SECS`: seconds between queue drains (default: 30)
    /// - `DRAIN_BATCH_SIZE`: queue items per drain (default: 100)
    pub async fn new() -> Result<Self, IndexingError> {
        let opensearch_url =
            env::var("OPENSEARCH_URL").unwrap_or_else(|_| DEFAULT_OPENSEARCH_URL.to_string());
        let index_name = env::var("ISSUE_INDEX")
            .unwrap_or_else(|_| IndexConfig::default().name().to_string());
        let database_path =
            env::var("DATABASE_PATH").unwrap_or_else(|_| DEFAULT_DATABASE_PATH.to_string());
        let drain_interval_secs = env_parsed("DRAIN_INTERVAL_SECS", DEFAULT_DRAIN_INTERVAL_SECS)?;
        let drain_batch_size = env_parsed("DRAIN_BATCH_SIZE", DEFAULT_DRAIN_BATCH_SIZE)?;

        info!(
            opensearch_url = %opensearch_url,
            index = %index_name,
            database_path = %database_path,
            "Initializing dependencies"
        );

        let backend = OpenSearchBackend::new(&opensearch_url, IndexConfig::new(index_name))
            .map_err(|e| {
                IndexingError::config(format!("Failed to create OpenSearch backend: {}", e))
            })?;

        backend
            .ensure_index()
            .await
            .map_err(|e| IndexingError::config(format!("Failed to ensure index: {}", e)))?;

        info!("OpenSearch connection verified");

        let queue = SqliteQueueStore::open(&database_path)
            .map_err(|e| IndexingError::config(format!("Failed to open retry queue: {}", e)))?;
        let issues = SqliteIssueStore::open(&database_path)
            .map_err(|e| IndexingError::config(format!("Failed to open issue store: {}", e)))?;

        let indexer = IssueIndexer::new(
            Arc::new(backend),
            Arc::new(queue),
            DocumentSource::new(Arc::new(issues)),
        );

        Ok(Self {
            indexer,
            drain_interval_secs,
            drain_batch_size,
        })
    }
}

/// Read an environment variable and parse it, falling back to a default when
/// unset.
fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> Result<T, IndexingError> {
    match env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|_| IndexingError::config(format!("Invalid value for {}: {}", name, value))),
        Err(_) => Ok(default),
    }
}
