//! SQLite-backed issue projection.
//!
//! Streams issue rows for indexing out of the `issues` table. Corpus and
//! project scans paginate internally by rowid so that no more than one page
//! of rows is held in memory at a time.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use rusqlite::{params, Connection, Row};
use tokio::sync::Mutex;

use issue_indexer_shared::{ComponentScope, IssueRow};

use crate::errors::StoreError;
use crate::interfaces::{IssueRowStream, IssueStore};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS issues (
    kee                 TEXT PRIMARY KEY,
    project_uuid        TEXT NOT NULL,
    organization_uuid   TEXT NOT NULL,
    component_uuid      TEXT NOT NULL,
    module_uuid_path    TEXT NOT NULL,
    path                TEXT,
    scope               TEXT NOT NULL,
    rule_repository     TEXT NOT NULL,
    rule_key            TEXT NOT NULL,
    language            TEXT,
    severity            TEXT NOT NULL,
    manual_severity     INTEGER NOT NULL,
    message             TEXT,
    line                INTEGER,
    effort              INTEGER,
    gap                 REAL,
    status              TEXT NOT NULL,
    resolution          TEXT,
    checksum            TEXT,
    attributes          TEXT,
    assignee            TEXT,
    author_login        TEXT,
    tags                TEXT,
    issue_type          INTEGER NOT NULL,
    issue_creation_date INTEGER NOT NULL,
    issue_update_date   INTEGER NOT NULL,
    issue_close_date    INTEGER,
    updated_at          INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS issues_project_uuid ON issues (project_uuid);
";

const ISSUE_COLUMNS: &str = "kee, project_uuid, organization_uuid, component_uuid, \
    module_uuid_path, path, scope, rule_repository, rule_key, language, severity, \
    manual_severity, message, line, effort, gap, status, resolution, checksum, \
    attributes, assignee, author_login, tags, issue_type, issue_creation_date, \
    issue_update_date, issue_close_date, updated_at";

/// Rows fetched per page during corpus and project scans.
const DEFAULT_SCAN_PAGE_SIZE: usize = 500;

/// Issue projection backed by a SQLite `issues` table.
pub struct SqliteIssueStore {
    conn: Arc<Mutex<Connection>>,
    scan_page_size: usize,
}

impl SqliteIssueStore {
    /// Open (and initialize if needed) the issues table in the given database
    /// file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Open an in-memory store; intended for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            scan_page_size: DEFAULT_SCAN_PAGE_SIZE,
        })
    }

    /// Override the scan page size.
    pub fn with_scan_page_size(mut self, scan_page_size: usize) -> Self {
        self.scan_page_size = scan_page_size;
        self
    }

    /// Insert or replace one issue row.
    pub async fn upsert(&self, row: &IssueRow) -> Result<(), StoreError> {
        let conn = self.conn.lock().await;
        conn.execute(
            &format!(
                "INSERT OR REPLACE INTO issues ({ISSUE_COLUMNS}) VALUES \
                 (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, \
                  ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28)"
            ),
            params![
                row.key,
                row.project_uuid,
                row.organization_uuid,
                row.component_uuid,
                row.module_uuid_path,
                row.path,
                row.scope.as_str(),
                row.rule_repository,
                row.rule_key,
                row.language,
                row.severity,
                row.manual_severity,
                row.message,
                row.line,
                row.effort,
                row.gap,
                row.status,
                row.resolution,
                row.checksum,
                row.attributes,
                row.assignee,
                row.author_login,
                row.tags,
                row.issue_type,
                row.issue_creation_date,
                row.issue_update_date,
                row.issue_close_date,
                row.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Delete one issue row; used when issues disappear from the source of
    /// truth.
    pub async fn delete(&self, issue_key: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().await;
        conn.execute("DELETE FROM issues WHERE kee = ?1", params![issue_key])?;
        Ok(())
    }
}

/// Map one result row into an `IssueRow`, starting at `offset`.
fn issue_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<IssueRow> {
    let scope_raw: String = row.get(offset + 6)?;
    let scope = ComponentScope::from_db_value(&scope_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            offset + 6,
            rusqlite::types::Type::Text,
            format!("unknown component scope: {scope_raw}").into(),
        )
    })?;
    Ok(IssueRow {
        key: row.get(offset)?,
        project_uuid: row.get(offset + 1)?,
        organization_uuid: row.get(offset + 2)?,
        component_uuid: row.get(offset + 3)?,
        module_uuid_path: row.get(offset + 4)?,
        path: row.get(offset + 5)?,
        scope,
        rule_repository: row.get(offset + 7)?,
        rule_key: row.get(offset + 8)?,
        language: row.get(offset + 9)?,
        severity: row.get(offset + 10)?,
        manual_severity: row.get(offset + 11)?,
        message: row.get(offset + 12)?,
        line: row.get(offset + 13)?,
        effort: row.get(offset + 14)?,
        gap: row.get(offset + 15)?,
        status: row.get(offset + 16)?,
        resolution: row.get(offset + 17)?,
        checksum: row.get(offset + 18)?,
        attributes: row.get(offset + 19)?,
        assignee: row.get(offset + 20)?,
        author_login: row.get(offset + 21)?,
        tags: row.get(offset + 22)?,
        issue_type: row.get(offset + 23)?,
        issue_creation_date: row.get(offset + 24)?,
        issue_update_date: row.get(offset + 25)?,
        issue_close_date: row.get(offset + 26)?,
        updated_at: row.get(offset + 27)?,
    })
}

/// Fetch one page of a rowid-ordered scan, optionally filtered by project.
fn fetch_scan_page(
    conn: &Connection,
    project_uuid: Option<&str>,
    last_rowid: i64,
    page_size: usize,
) -> Result<Vec<(i64, IssueRow)>, StoreError> {
    let map_row = |row: &Row<'_>| -> rusqlite::Result<(i64, IssueRow)> {
        Ok((row.get(0)?, issue_from_row(row, 1)?))
    };

    let rows = match project_uuid {
        Some(project) => {
            let mut stmt = conn.prepare(&format!(
                "SELECT rowid, {ISSUE_COLUMNS} FROM issues \
                 WHERE rowid > ?1 AND project_uuid = ?2 ORDER BY rowid LIMIT ?3"
            ))?;
            let mapped = stmt.query_map(params![last_rowid, project, page_size as i64], map_row)?;
            mapped.collect::<Result<Vec<_>, _>>()?
        }
        None => {
            let mut stmt = conn.prepare(&format!(
                "SELECT rowid, {ISSUE_COLUMNS} FROM issues \
                 WHERE rowid > ?1 ORDER BY rowid LIMIT ?2"
            ))?;
            let mapped = stmt.query_map(params![last_rowid, page_size as i64], map_row)?;
            mapped.collect::<Result<Vec<_>, _>>()?
        }
    };
    Ok(rows)
}

#[async_trait]
impl IssueStore for SqliteIssueStore {
    async fn stream_for_keys(&self, keys: Vec<String>) -> Result<IssueRowStream, StoreError> {
        if keys.is_empty() {
            return Ok(stream::empty().boxed());
        }

        let rows = {
            let conn = self.conn.lock().await;
            let placeholders = vec!["?"; keys.len()].join(", ");
            let mut stmt = conn.prepare(&format!(
                "SELECT {ISSUE_COLUMNS} FROM issues WHERE kee IN ({placeholders})"
            ))?;
            let mapped = stmt.query_map(rusqlite::params_from_iter(keys.iter()), |row| {
                issue_from_row(row, 0)
            })?;
            mapped.collect::<Result<Vec<_>, _>>()?
        };

        Ok(stream::iter(rows.into_iter().map(Ok)).boxed())
    }

    async fn stream_for_project(
        &self,
        project_uuid: Option<String>,
    ) -> Result<IssueRowStream, StoreError> {
        let conn = Arc::clone(&self.conn);
        let page_size = self.scan_page_size;

        let stream = stream::try_unfold(0i64, move |last_rowid| {
            let conn = Arc::clone(&conn);
            let project_uuid = project_uuid.clone();
            async move {
                let page = {
                    let conn = conn.lock().await;
                    fetch_scan_page(&conn, project_uuid.as_deref(), last_rowid, page_size)?
                };
                match page.last() {
                    None => Ok::<_, StoreError>(None),
                    Some((rowid, _)) => {
                        let next_rowid = *rowid;
                        let rows: Vec<IssueRow> =
                            page.into_iter().map(|(_, row)| row).collect();
                        Ok(Some((
                            stream::iter(rows.into_iter().map(Ok::<_, StoreError>)),
                            next_rowid,
                        )))
                    }
                }
            }
        })
        .try_flatten()
        .boxed();

        Ok(stream)
    }
}
