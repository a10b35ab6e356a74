//! OpenSearch index configuration and mappings.
//!
//! This module defines the index settings and mappings for the issue search
//! index.

use serde_json::{json, Value};

/// Default name of the issue search index.
pub const DEFAULT_INDEX_NAME: &str = "issues";

/// Name of the issue search index.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    name: String,
}

impl IndexConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self::new(DEFAULT_INDEX_NAME)
    }
}

/// Get the index settings and mappings for the issue search index.
///
/// Identity and filter fields are keywords; the message is the only full-text
/// field; dates are stored as epoch milliseconds.
pub fn issue_index_settings() -> Value {
    json!({
        "settings": {
            "number_of_shards": 1,
            "number_of_replicas": 1
        },
        "mappings": {
            "properties": {
                "key": { "type": "keyword" },
                "projectUuid": { "type": "keyword" },
                "organizationUuid": { "type": "keyword" },
                "componentUuid": { "type": "keyword" },
                "moduleUuid": { "type": "keyword" },
                "moduleUuidPath": { "type": "keyword" },
                "filePath": { "type": "keyword" },
                "directoryPath": { "type": "keyword" },
                "ruleKey": { "type": "keyword" },
                "language": { "type": "keyword" },
                "severity": { "type": "keyword" },
                "manualSeverity": { "type": "boolean" },
                "message": { "type": "text" },
                "line": { "type": "integer" },
                "effort": { "type": "long" },
                "gap": { "type": "double" },
                "status": { "type": "keyword" },
                "resolution": { "type": "keyword" },
                "checksum": { "type": "keyword", "index": false },
                "attributes": { "type": "keyword", "index": false },
                "assignee": { "type": "keyword" },
                "authorLogin": { "type": "keyword" },
                "tags": { "type": "keyword" },
                "issueType": { "type": "integer" },
                "issueCreationDate": { "type": "date", "format": "epoch_millis" },
                "issueUpdateDate": { "type": "date", "format": "epoch_millis" },
                "issueCloseDate": { "type": "date", "format": "epoch_millis" },
                "updatedAt": { "type": "date", "format": "epoch_millis" }
            }
        }
    })
}
