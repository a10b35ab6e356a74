//! Project lifecycle events relevant to indexing.

/// Cause of a project-level reindex request.
///
/// Only `NewAnalysis` changes the issue index; the other causes touch data
/// this index does not carry. The enum is closed, so dispatch over it is
/// checked exhaustively at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectIndexingCause {
    Created,
    KeyUpdated,
    TagsUpdated,
    NewAnalysis,
}
