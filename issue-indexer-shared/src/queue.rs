//! Retry queue items.
//!
//! A queue item records one pending unit of index work: either a single
//! document addressed by its key, or a whole project. Items are written before
//! the live index write is attempted and removed only once the write is
//! confirmed, so a crash at any point leaves the work recoverable.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Kind of entity a queue item refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityType {
    Issue,
}

impl EntityType {
    /// The code persisted in the queue table.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Issue => "ISSUE",
        }
    }

    /// Parse the persisted code. Returns `None` for unknown values.
    pub fn from_db_value(value: &str) -> Option<Self> {
        match value {
            "ISSUE" => Some(EntityType::Issue),
            _ => None,
        }
    }
}

/// How a queue item's reference id is to be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grouping {
    /// The reference id is an individual document key.
    ByKeys,
    /// The reference id is a project identifier; the item covers every
    /// document of that project.
    ByProject,
}

impl Grouping {
    /// The label persisted in the queue table.
    pub fn label(&self) -> &'static str {
        match self {
            Grouping::ByKeys => "issueKeys",
            Grouping::ByProject => "projectUuid",
        }
    }

    /// Parse a persisted label. Returns `None` for unknown labels, which the
    /// reconciliation dead-letters.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "issueKeys" => Some(Grouping::ByKeys),
            "projectUuid" => Some(Grouping::ByProject),
            _ => None,
        }
    }
}

/// A pending unit of index work.
///
/// The grouping label is kept raw as read from storage; rows written by older
/// or foreign code may carry labels this version does not understand, and
/// those must still round-trip far enough to be dead-lettered explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryQueueItem {
    /// Queue-local identifier.
    pub id: String,
    pub entity_type: EntityType,
    /// Reference id: a document key or a project identifier, depending on the
    /// grouping.
    pub doc_id: String,
    /// Raw grouping label as persisted.
    pub doc_id_type: String,
    pub created_at: DateTime<Utc>,
}

impl RetryQueueItem {
    fn new(doc_id: String, grouping: Grouping) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            entity_type: EntityType::Issue,
            doc_id,
            doc_id_type: grouping.label().to_string(),
            created_at: Utc::now(),
        }
    }

    /// Item covering a single issue, addressed by its document key.
    pub fn for_issue_key(issue_key: impl Into<String>) -> Self {
        Self::new(issue_key.into(), Grouping::ByKeys)
    }

    /// Item covering every issue of a project.
    pub fn for_project(project_uuid: impl Into<String>) -> Self {
        Self::new(project_uuid.into(), Grouping::ByProject)
    }

    /// Parsed grouping, `None` when the persisted label is unrecognized.
    pub fn grouping(&self) -> Option<Grouping> {
        Grouping::from_label(&self.doc_id_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_key_item() {
        let item = RetryQueueItem::for_issue_key("ISSUE-1");
        assert_eq!(item.doc_id, "ISSUE-1");
        assert_eq!(item.grouping(), Some(Grouping::ByKeys));
        assert_eq!(item.entity_type, EntityType::Issue);
    }

    #[test]
    fn test_project_item() {
        let item = RetryQueueItem::for_project("P1");
        assert_eq!(item.doc_id, "P1");
        assert_eq!(item.grouping(), Some(Grouping::ByProject));
    }

    #[test]
    fn test_items_get_distinct_ids() {
        let a = RetryQueueItem::for_issue_key("ISSUE-1");
        let b = RetryQueueItem::for_issue_key("ISSUE-1");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_unknown_label_has_no_grouping() {
        let mut item = RetryQueueItem::for_issue_key("ISSUE-1");
        item.doc_id_type = "somethingElse".to_string();
        assert_eq!(item.grouping(), None);
    }

    #[test]
    fn test_label_round_trip() {
        assert_eq!(Grouping::from_label(Grouping::ByKeys.label()), Some(Grouping::ByKeys));
        assert_eq!(Grouping::from_label(Grouping::ByProject.label()), Some(Grouping::ByProject));
    }
}
