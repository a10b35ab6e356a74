//! OpenSearch backend implementation.
//!
//! This module provides the concrete implementation of `SearchBackend`
//! using the OpenSearch Rust client.

use async_trait::async_trait;
use opensearch::{
    http::request::JsonBody,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesExistsParts, IndicesRefreshParts},
    BulkParts, DeleteByQueryParts, OpenSearch,
};
use serde_json::{json, Value};
use tracing::{debug, error, info};
use url::Url;

use issue_indexer_shared::BulkOp;

use crate::errors::SearchError;
use crate::interfaces::SearchBackend;
use crate::opensearch::index_config::{issue_index_settings, IndexConfig};
use crate::opensearch::queries::project_issues_query;
use crate::types::BulkItemOutcome;

/// OpenSearch implementation of the bulk write backend.
///
/// Every operation is routed by project identifier so that a project's
/// documents are co-located on one shard.
pub struct OpenSearchBackend {
    client: OpenSearch,
    index: IndexConfig,
}

impl OpenSearchBackend {
    /// Create a new backend connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    /// * `index` - The index configuration
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchBackend)` - A new backend instance
    /// * `Err(SearchError)` - If connection setup fails
    pub fn new(url: &str, index: IndexConfig) -> Result<Self, SearchError> {
        let parsed_url = Url::parse(url).map_err(|e| SearchError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(url = %url, index = %index.name(), "Created OpenSearch backend");

        Ok(Self { client, index })
    }

    /// Create the issue index with its mapping if it does not exist yet.
    pub async fn ensure_index(&self) -> Result<(), SearchError> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[self.index.name()]))
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        if response.status_code().is_success() {
            debug!(index = %self.index.name(), "Index already exists");
            return Ok(());
        }

        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(self.index.name()))
            .body(issue_index_settings())
            .send()
            .await
            .map_err(|e| SearchError::index_creation(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(SearchError::index_creation(format!(
                "Index creation failed with status {}: {}",
                status, error_body
            )));
        }

        info!(index = %self.index.name(), "Created index");
        Ok(())
    }

    /// Bulk action and source lines for one operation.
    fn bulk_lines(op: &BulkOp) -> Result<Vec<JsonBody<Value>>, SearchError> {
        match op {
            BulkOp::Index(doc) => {
                let source = serde_json::to_value(doc)
                    .map_err(|e| SearchError::serialization(e.to_string()))?;
                Ok(vec![
                    json!({ "index": { "_id": doc.key, "routing": doc.project_uuid } }).into(),
                    source.into(),
                ])
            }
            BulkOp::DeleteByKey { doc_id, routing } => Ok(vec![json!({
                "delete": { "_id": doc_id, "routing": routing }
            })
            .into()]),
        }
    }
}

#[async_trait]
impl SearchBackend for OpenSearchBackend {
    async fn bulk_execute(&self, ops: &[BulkOp]) -> Result<Vec<BulkItemOutcome>, SearchError> {
        if ops.is_empty() {
            return Ok(Vec::new());
        }

        let mut body: Vec<JsonBody<Value>> = Vec::with_capacity(ops.len() * 2);
        for op in ops {
            body.extend(Self::bulk_lines(op)?);
        }

        let response = self
            .client
            .bulk(BulkParts::Index(self.index.name()))
            .body(body)
            .send()
            .await
            .map_err(|e| SearchError::bulk(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Bulk request failed");
            return Err(SearchError::bulk(format!(
                "Bulk request failed with status {}: {}",
                status, error_body
            )));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))?;
        let items = json["items"]
            .as_array()
            .ok_or_else(|| SearchError::parse("bulk response has no items array"))?;
        if items.len() != ops.len() {
            return Err(SearchError::parse(format!(
                "bulk response has {} items for {} operations",
                items.len(),
                ops.len()
            )));
        }

        let outcomes = ops
            .iter()
            .zip(items)
            .map(|(op, item)| {
                let entry = item
                    .get("index")
                    .or_else(|| item.get("delete"))
                    .unwrap_or(item);
                let item_status = entry["status"].as_u64().unwrap_or(0) as u16;
                let is_delete = matches!(op, BulkOp::DeleteByKey { .. });

                // A delete of a document that is already gone is a success.
                if (200..300).contains(&item_status) || (is_delete && item_status == 404) {
                    BulkItemOutcome::ok(op.doc_id())
                } else {
                    let reason = entry
                        .get("error")
                        .map(|e| e.to_string())
                        .unwrap_or_else(|| format!("status {}", item_status));
                    BulkItemOutcome::rejected(op.doc_id(), reason)
                }
            })
            .collect();

        Ok(outcomes)
    }

    async fn delete_by_project(&self, project_uuid: &str) -> Result<(), SearchError> {
        let response = self
            .client
            .delete_by_query(DeleteByQueryParts::Index(&[self.index.name()]))
            .routing(&[project_uuid])
            .body(project_issues_query(project_uuid))
            .send()
            .await
            .map_err(|e| SearchError::delete(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Delete-by-query request failed");
            return Err(SearchError::delete(format!(
                "Delete-by-query failed with status {}: {}",
                status, error_body
            )));
        }

        debug!(project_uuid = %project_uuid, "Deleted project documents");
        Ok(())
    }

    async fn refresh(&self) -> Result<(), SearchError> {
        let response = self
            .client
            .indices()
            .refresh(IndicesRefreshParts::Index(&[self.index.name()]))
            .send()
            .await
            .map_err(|e| SearchError::refresh(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            return Err(SearchError::refresh(format!(
                "Refresh failed with status {}",
                status
            )));
        }

        Ok(())
    }
}
