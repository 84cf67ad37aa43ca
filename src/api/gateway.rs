// src/api/gateway.rs
//! The Notion gateway: retried, paginated access to databases, records and
//! content blocks on top of a `NotionTransport`.

use super::block_walk::collect_plain_text;
use super::simple_pagination::fetch_all_pages;
use super::types::{
    last_edited_filter, ContentReplacement, PaginatedResponse, QueryTarget, RecordQuery,
};
use super::{NotionTransport, RemoteGateway};
use crate::constants::{BLOCK_APPEND_CHUNK_SIZE, NOTION_API_PAGE_SIZE};
use crate::error::AppError;
use crate::error_recovery::{retry_with_backoff, RetryPolicy};
use crate::model::{DatabaseSchema, RemoteRecord, SchemaResolution};
use crate::pipeline::BlockRenderer;
use crate::types::NotionId;
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;

/// Retrying, paginating client for the parts of the Notion API the mirror uses.
///
/// The data-source id of each database is cached per gateway instance, so
/// two gateways never share lookups.
pub struct NotionGateway<T> {
    transport: T,
    retry: RetryPolicy,
    data_source_ids: Mutex<HashMap<String, String>>,
}

impl<T: NotionTransport> NotionGateway<T> {
    pub fn new(transport: T) -> Self {
        Self::with_retry_policy(transport, RetryPolicy::default())
    }

    pub fn with_retry_policy(transport: T, retry: RetryPolicy) -> Self {
        Self {
            transport,
            retry,
            data_source_ids: Mutex::new(HashMap::new()),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn get_database(&self, database_id: &str) -> Result<Value, AppError> {
        retry_with_backoff("databases.retrieve", self.retry, || {
            self.transport.retrieve_database(database_id)
        })
        .await
    }

    pub async fn get_data_source(&self, data_source_id: &str) -> Result<Value, AppError> {
        retry_with_backoff("data_sources.retrieve", self.retry, || {
            self.transport.retrieve_data_source(data_source_id)
        })
        .await
    }

    /// First data source of a database, from the cache or from `database`
    /// (fetched when not supplied).
    pub async fn default_data_source_id(
        &self,
        database_id: &str,
        database: Option<&Value>,
    ) -> Result<Option<String>, AppError> {
        let cached = self.data_source_ids.lock().get(database_id).cloned();
        if cached.is_some() {
            return Ok(cached);
        }

        let fetched;
        let database = match database {
            Some(value) => value,
            None => {
                fetched = self.get_database(database_id).await?;
                &fetched
            }
        };

        let found = first_data_source_id(database);
        if let Some(id) = &found {
            self.data_source_ids
                .lock()
                .insert(database_id.to_string(), id.clone());
        }
        Ok(found)
    }

    /// Resolves where a database's property schema lives.
    pub async fn resolve_schema(
        &self,
        database_id: &str,
        database: &Value,
    ) -> Result<SchemaResolution, AppError> {
        if let Some(properties) = non_empty_properties(database) {
            return Ok(SchemaResolution::FoundOnPrimary(properties));
        }

        let Some(data_source_id) = self.default_data_source_id(database_id, Some(database)).await?
        else {
            return Ok(SchemaResolution::NotFound);
        };

        let data_source = self.get_data_source(&data_source_id).await?;
        let properties: IndexMap<String, Value> = data_source
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| props.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();
        Ok(SchemaResolution::FoundOnSubresource {
            data_source_id,
            properties,
        })
    }

    /// Every child block of `block_id`, across all pages.
    pub async fn list_all_block_children(&self, block_id: &str) -> Result<Vec<Value>, AppError> {
        let pages = fetch_all_pages(|cursor| self.block_children_page(block_id.to_string(), cursor))
            .await?;
        Ok(pages.items)
    }

    async fn block_children_page(
        &self,
        block_id: String,
        cursor: Option<String>,
    ) -> Result<PaginatedResponse<Value>, AppError> {
        retry_with_backoff("blocks.children.list", self.retry, || {
            self.transport
                .list_block_children(&block_id, cursor.as_deref(), NOTION_API_PAGE_SIZE)
        })
        .await
    }

    /// Deletes every top-level child block of a record; returns how many.
    pub async fn clear_record_content(&self, record_id: &str) -> Result<usize, AppError> {
        let mut deleted = 0;
        for block in self.list_all_block_children(record_id).await? {
            let Some(block_id) = block
                .get("id")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|id| !id.is_empty())
            else {
                continue;
            };
            retry_with_backoff("blocks.delete", self.retry, || {
                self.transport.delete_block(block_id)
            })
            .await?;
            deleted += 1;
        }
        Ok(deleted)
    }

    /// Appends blocks to a record in chunks the API accepts; returns how many.
    pub async fn append_record_blocks(
        &self,
        record_id: &str,
        blocks: &[Value],
    ) -> Result<usize, AppError> {
        let mut appended = 0;
        for chunk in blocks.chunks(BLOCK_APPEND_CHUNK_SIZE) {
            retry_with_backoff("blocks.children.append", self.retry, || {
                self.transport.append_block_children(record_id, chunk)
            })
            .await?;
            appended += chunk.len();
        }
        Ok(appended)
    }

    /// Renders markdown through `renderer` and replaces the record's content.
    pub async fn replace_record_markdown(
        &self,
        record_id: &str,
        markdown: &str,
        renderer: &dyn BlockRenderer,
    ) -> Result<ContentReplacement, AppError> {
        let blocks = renderer.render(markdown)?;
        self.replace_record_content(record_id, &blocks).await
    }
}

#[async_trait::async_trait]
impl<T: NotionTransport> RemoteGateway for NotionGateway<T> {
    async fn fetch_schema(&self, database_id: &NotionId) -> Result<DatabaseSchema, AppError> {
        let database = self.get_database(database_id.as_str()).await?;
        let resolution = self.resolve_schema(database_id.as_str(), &database).await?;
        Ok(DatabaseSchema {
            database,
            resolution,
        })
    }

    async fn query_all_records(
        &self,
        database_id: &NotionId,
        page_size: u32,
        edited_after: Option<&str>,
    ) -> Result<Vec<RemoteRecord>, AppError> {
        let target = match self.default_data_source_id(database_id.as_str(), None).await? {
            Some(data_source_id) => QueryTarget::DataSource(data_source_id),
            None => QueryTarget::Database(database_id.to_string()),
        };
        let filter = last_edited_filter(edited_after);
        let target = &target;
        let filter = &filter;

        let pages = fetch_all_pages(|cursor| async move {
            let body = RecordQuery {
                page_size,
                start_cursor: cursor,
                filter: filter.clone(),
            }
            .to_body();
            retry_with_backoff("records.query", self.retry, || {
                self.transport.query_records(target, &body)
            })
            .await
        })
        .await?;

        pages
            .items
            .into_iter()
            .map(RemoteRecord::from_json)
            .collect()
    }

    async fn fetch_record_plain_text(
        &self,
        record_id: &str,
        max_chars: usize,
        max_depth: usize,
    ) -> Result<String, AppError> {
        collect_plain_text(record_id, max_chars, max_depth, |block_id, cursor| {
            self.block_children_page(block_id, cursor)
        })
        .await
    }

    async fn update_record_properties(
        &self,
        record_id: &str,
        properties: &Value,
    ) -> Result<Value, AppError> {
        let body = json!({ "properties": properties });
        retry_with_backoff("pages.update", self.retry, || {
            self.transport.update_page(record_id, &body)
        })
        .await
    }

    async fn replace_record_content(
        &self,
        record_id: &str,
        blocks: &[Value],
    ) -> Result<ContentReplacement, AppError> {
        let deleted = self.clear_record_content(record_id).await?;
        let appended = self.append_record_blocks(record_id, blocks).await?;
        log::info!(
            "Replaced content of {}: deleted {} blocks, appended {}",
            record_id,
            deleted,
            appended
        );
        Ok(ContentReplacement { deleted, appended })
    }
}

fn non_empty_properties(database: &Value) -> Option<IndexMap<String, Value>> {
    database
        .get("properties")
        .and_then(Value::as_object)
        .filter(|props| !props.is_empty())
        .map(|props| props.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
}

fn first_data_source_id(database: &Value) -> Option<String> {
    database
        .get("data_sources")
        .and_then(Value::as_array)?
        .iter()
        .filter_map(|source| source.get("id").and_then(Value::as_str))
        .map(str::trim)
        .find(|id| !id.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_source_id_is_first_non_blank_entry() {
        let db = json!({"data_sources": [{"id": " "}, {"id": "ds-2"}, {"id": "ds-3"}]});
        assert_eq!(first_data_source_id(&db).as_deref(), Some("ds-2"));
        assert_eq!(first_data_source_id(&json!({})), None);
    }

    #[test]
    fn empty_primary_properties_do_not_count() {
        assert!(non_empty_properties(&json!({"properties": {}})).is_none());
        let props = non_empty_properties(&json!({"properties": {"Name": {"type": "title"}}}));
        assert_eq!(props.map(|p| p.len()), Some(1));
    }
}
