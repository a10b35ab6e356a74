//! OpenSearch query builders.

use serde_json::{json, Value};

/// Build the query selecting every issue document of a project.
///
/// Used by the routed delete-by-query that removes a whole project from the
/// index.
pub fn project_issues_query(project_uuid: &str) -> Value {
    json!({
        "query": {
            "bool": {
                "must": [
                    { "term": { "projectUuid": project_uuid } }
                ]
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_issues_query_filters_on_project_uuid() {
        let query = project_issues_query("P1");
        assert_eq!(query["query"]["bool"]["must"][0]["term"]["projectUuid"], "P1");
    }
}
