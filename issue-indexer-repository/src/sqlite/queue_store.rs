//! SQLite-backed retry queue store.

use std::path::Path;

use async_trait::async_trait;
use chrono::DateTime;
use rusqlite::{params, Connection};
use tokio::sync::Mutex;
use tracing::debug;

use issue_indexer_shared::{EntityType, RetryQueueItem};

use crate::errors::StoreError;
use crate::interfaces::QueueStore;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS retry_queue (
    uuid        TEXT PRIMARY KEY,
    entity_type TEXT NOT NULL,
    doc_id      TEXT NOT NULL,
    doc_id_type TEXT NOT NULL,
    created_at  INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS retry_queue_created_at ON retry_queue (created_at);
";

/// Retry queue persisted in a SQLite table.
///
/// Every call runs in its own implicit transaction, which gives the engine
/// the per-item commit granularity it needs for crash recovery.
pub struct SqliteQueueStore {
    conn: Mutex<Connection>,
}

impl SqliteQueueStore {
    /// Open (and initialize if needed) the queue table in the given database
    /// file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Open an in-memory queue. The queue is gone when the store is dropped;
    /// intended for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

#[async_trait]
impl QueueStore for SqliteQueueStore {
    async fn insert(&self, item: &RetryQueueItem) -> Result<(), StoreError> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO retry_queue (uuid, entity_type, doc_id, doc_id_type, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                item.id,
                item.entity_type.as_str(),
                item.doc_id,
                item.doc_id_type,
                item.created_at.timestamp_millis(),
            ],
        )?;
        debug!(id = %item.id, doc_id = %item.doc_id, "Enqueued retry item");
        Ok(())
    }

    async fn delete(&self, item: &RetryQueueItem) -> Result<(), StoreError> {
        let conn = self.conn.lock().await;
        conn.execute("DELETE FROM retry_queue WHERE uuid = ?1", params![item.id])?;
        Ok(())
    }

    async fn select_pending(&self, limit: usize) -> Result<Vec<RetryQueueItem>, StoreError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT uuid, entity_type, doc_id, doc_id_type, created_at
             FROM retry_queue
             WHERE entity_type = ?1
             ORDER BY created_at ASC, uuid ASC
             LIMIT ?2",
        )?;
        let items = stmt
            .query_map(
                params![EntityType::Issue.as_str(), limit as i64],
                |row| {
                    let entity_raw: String = row.get(1)?;
                    let entity_type = EntityType::from_db_value(&entity_raw).ok_or_else(|| {
                        rusqlite::Error::FromSqlConversionFailure(
                            1,
                            rusqlite::types::Type::Text,
                            format!("unknown entity type: {entity_raw}").into(),
                        )
                    })?;
                    let created_ms: i64 = row.get(4)?;
                    let created_at = DateTime::from_timestamp_millis(created_ms).ok_or_else(|| {
                        rusqlite::Error::FromSqlConversionFailure(
                            4,
                            rusqlite::types::Type::Integer,
                            format!("timestamp out of range: {created_ms}").into(),
                        )
                    })?;
                    Ok(RetryQueueItem {
                        id: row.get(0)?,
                        entity_type,
                        doc_id: row.get(2)?,
                        doc_id_type: row.get(3)?,
                        created_at,
                    })
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }
}
