//! SQLite-backed implementations of the store traits.
//!
//! The retry queue and the issue projection share one database file; each
//! store owns its own connection.

mod issue_store;
mod queue_store;

pub use issue_store::SqliteIssueStore;
pub use queue_store::SqliteQueueStore;
