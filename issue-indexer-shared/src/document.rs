//! Issue rows and their index-ready document form.
//!
//! `IssueRow` is the shape produced by the relational projection; `IssueDocument`
//! is the denormalized form written to the search index. The derivation rules
//! (tags, file/directory paths, module identifier) live on the row so they can
//! be tested independently of any storage backend.

use serde::Serialize;

/// Scope of the component an issue is attached to.
///
/// Stored in the database as a three-letter code (`PRJ`, `DIR`, `FIL`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentScope {
    Project,
    Directory,
    File,
}

impl ComponentScope {
    /// The code persisted in the issues table.
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentScope::Project => "PRJ",
            ComponentScope::Directory => "DIR",
            ComponentScope::File => "FIL",
        }
    }

    /// Parse the persisted code. Returns `None` for unknown values.
    pub fn from_db_value(value: &str) -> Option<Self> {
        match value {
            "PRJ" => Some(ComponentScope::Project),
            "DIR" => Some(ComponentScope::Directory),
            "FIL" => Some(ComponentScope::File),
            _ => None,
        }
    }
}

/// One issue as projected out of relational storage for indexing.
///
/// Field shapes mirror the storage schema: tags as a comma-separated string,
/// the component path together with its scope, the module path as a
/// dot-separated string, and dates as epoch milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct IssueRow {
    pub key: String,
    pub project_uuid: String,
    pub organization_uuid: String,
    pub component_uuid: String,
    pub module_uuid_path: String,
    pub path: Option<String>,
    pub scope: ComponentScope,
    pub rule_repository: String,
    pub rule_key: String,
    pub language: Option<String>,
    pub severity: String,
    pub manual_severity: bool,
    pub message: Option<String>,
    pub line: Option<i32>,
    pub effort: Option<i64>,
    pub gap: Option<f64>,
    pub status: String,
    pub resolution: Option<String>,
    pub checksum: Option<String>,
    pub attributes: Option<String>,
    pub assignee: Option<String>,
    pub author_login: Option<String>,
    pub tags: Option<String>,
    pub issue_type: i32,
    pub issue_creation_date: i64,
    pub issue_update_date: i64,
    pub issue_close_date: Option<i64>,
    pub updated_at: i64,
}

impl IssueRow {
    /// Tags as a normalized list: split on `,`, trimmed, empty tokens dropped,
    /// order preserved.
    pub fn tags_list(&self) -> Vec<String> {
        self.tags
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// The component path, absent for project-level issues.
    pub fn file_path(&self) -> Option<&str> {
        match self.path.as_deref() {
            Some(path) if self.scope != ComponentScope::Project => Some(path),
            _ => None,
        }
    }

    /// Directory containing the issue's component.
    ///
    /// Directory-level issues keep the raw path. Otherwise the trailing
    /// segment is stripped at the last `/`, falling back to `"/"` when the
    /// path has no slash or the only slash is leading.
    pub fn directory_path(&self) -> Option<String> {
        let path = self.path.as_deref()?;
        if self.scope == ComponentScope::Directory {
            return Some(path.to_string());
        }
        if path.is_empty() {
            return None;
        }
        match path.rfind('/') {
            Some(idx) if idx > 0 => Some(path[..idx].to_string()),
            _ => Some("/".to_string()),
        }
    }

    /// Last non-empty segment of the dot-separated module path.
    pub fn module_uuid(&self) -> &str {
        self.module_uuid_path
            .split('.')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .last()
            .unwrap_or("")
    }
}

/// The denormalized representation of one issue as written to the search
/// index. The `key` field is the document id; `project_uuid` is the routing
/// key used for partitioned placement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueDocument {
    pub key: String,
    pub project_uuid: String,
    pub organization_uuid: String,
    pub component_uuid: String,
    pub module_uuid: String,
    pub module_uuid_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory_path: Option<String>,
    pub rule_key: String,
    pub language: Option<String>,
    pub severity: String,
    pub manual_severity: bool,
    pub message: Option<String>,
    pub line: Option<i32>,
    pub effort: Option<i64>,
    pub gap: Option<f64>,
    pub status: String,
    pub resolution: Option<String>,
    pub checksum: Option<String>,
    pub attributes: Option<String>,
    pub assignee: Option<String>,
    pub author_login: Option<String>,
    pub tags: Vec<String>,
    pub issue_type: i32,
    pub issue_creation_date: i64,
    pub issue_update_date: i64,
    pub issue_close_date: Option<i64>,
    pub updated_at: i64,
}

impl From<IssueRow> for IssueDocument {
    fn from(row: IssueRow) -> Self {
        let tags = row.tags_list();
        let file_path = row.file_path().map(str::to_string);
        let directory_path = row.directory_path();
        let module_uuid = row.module_uuid().to_string();
        let rule_key = format!("{}:{}", row.rule_repository, row.rule_key);

        IssueDocument {
            key: row.key,
            project_uuid: row.project_uuid,
            organization_uuid: row.organization_uuid,
            component_uuid: row.component_uuid,
            module_uuid,
            module_uuid_path: row.module_uuid_path,
            file_path,
            directory_path,
            rule_key,
            language: row.language,
            severity: row.severity,
            manual_severity: row.manual_severity,
            message: row.message,
            line: row.line,
            effort: row.effort,
            gap: row.gap,
            status: row.status,
            resolution: row.resolution,
            checksum: row.checksum,
            attributes: row.attributes,
            assignee: row.assignee,
            author_login: row.author_login,
            tags,
            issue_type: row.issue_type,
            issue_creation_date: row.issue_creation_date,
            issue_update_date: row.issue_update_date,
            issue_close_date: row.issue_close_date,
            updated_at: row.updated_at,
        }
    }
}
