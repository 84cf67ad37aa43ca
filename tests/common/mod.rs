// tests/common/mod.rs
//! Shared fixtures: a scripted in-memory Notion transport and JSON builders.

#![allow(dead_code)]

use notion_sync::api::{NotionTransport, PaginatedResponse, QueryTarget};
use notion_sync::{AppError, NotionErrorCode};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;

/// Scripted transport serving databases, data sources, records and block
/// trees from memory, recording every call it receives.
#[derive(Default)]
pub struct FakeTransport {
    state: Mutex<FakeState>,
}

#[derive(Default)]
struct FakeState {
    databases: HashMap<String, Value>,
    data_sources: HashMap<String, Value>,
    records: Vec<Value>,
    blocks: HashMap<String, Vec<Value>>,
    transient_failures: HashMap<&'static str, u32>,
    calls: HashMap<&'static str, u32>,
    queries: Vec<(QueryTarget, Value)>,
    listed_blocks: Vec<String>,
    deleted: Vec<String>,
    appended: Vec<(String, usize)>,
    updates: Vec<(String, Value)>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_database(self, database_id: &str, database: Value) -> Self {
        self.state
            .lock()
            .databases
            .insert(database_id.to_string(), database);
        self
    }

    pub fn with_data_source(self, data_source_id: &str, data_source: Value) -> Self {
        self.state
            .lock()
            .data_sources
            .insert(data_source_id.to_string(), data_source);
        self
    }

    pub fn with_records(self, records: Vec<Value>) -> Self {
        self.set_records(records);
        self
    }

    pub fn with_children(self, block_id: &str, children: Vec<Value>) -> Self {
        self.state
            .lock()
            .blocks
            .insert(block_id.to_string(), children);
        self
    }

    /// Replaces the remote record set, as if edited between two syncs.
    pub fn set_records(&self, records: Vec<Value>) {
        self.state.lock().records = records;
    }

    /// The next `count` calls of `operation` fail with `rate_limited`.
    pub fn fail_transiently(&self, operation: &'static str, count: u32) {
        self.state.lock().transient_failures.insert(operation, count);
    }

    pub fn calls(&self, operation: &str) -> u32 {
        self.state.lock().calls.get(operation).copied().unwrap_or(0)
    }

    pub fn queries(&self) -> Vec<(QueryTarget, Value)> {
        self.state.lock().queries.clone()
    }

    pub fn listed_blocks(&self) -> Vec<String> {
        self.state.lock().listed_blocks.clone()
    }

    pub fn deleted_blocks(&self) -> Vec<String> {
        self.state.lock().deleted.clone()
    }

    pub fn appended_chunks(&self) -> Vec<(String, usize)> {
        self.state.lock().appended.clone()
    }

    pub fn updates(&self) -> Vec<(String, Value)> {
        self.state.lock().updates.clone()
    }

    fn enter(&self, operation: &'static str) -> Result<(), AppError> {
        let mut state = self.state.lock();
        *state.calls.entry(operation).or_default() += 1;
        if let Some(remaining) = state.transient_failures.get_mut(operation) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(service_error(NotionErrorCode::RateLimited, 429));
            }
        }
        Ok(())
    }
}

pub fn service_error(code: NotionErrorCode, status: u16) -> AppError {
    AppError::NotionService {
        message: format!("scripted {}", code),
        code,
        status,
    }
}

fn page_of(items: &[Value], cursor: Option<&str>, page_size: usize) -> PaginatedResponse<Value> {
    let start: usize = cursor.and_then(|c| c.parse().ok()).unwrap_or(0);
    let end = (start + page_size.max(1)).min(items.len());
    let results = items.get(start..end).map(<[Value]>::to_vec).unwrap_or_default();
    if end < items.len() {
        PaginatedResponse::with_more(results, end.to_string())
    } else {
        PaginatedResponse::last(results)
    }
}

#[async_trait::async_trait]
impl NotionTransport for FakeTransport {
    async fn retrieve_database(&self, database_id: &str) -> Result<Value, AppError> {
        self.enter("databases.retrieve")?;
        self.state
            .lock()
            .databases
            .get(database_id)
            .cloned()
            .ok_or_else(|| service_error(NotionErrorCode::ObjectNotFound, 404))
    }

    async fn retrieve_data_source(&self, data_source_id: &str) -> Result<Value, AppError> {
        self.enter("data_sources.retrieve")?;
        self.state
            .lock()
            .data_sources
            .get(data_source_id)
            .cloned()
            .ok_or_else(|| service_error(NotionErrorCode::ObjectNotFound, 404))
    }

    async fn query_records(
        &self,
        target: &QueryTarget,
        body: &Value,
    ) -> Result<PaginatedResponse<Value>, AppError> {
        self.enter("records.query")?;
        let mut state = self.state.lock();
        state.queries.push((target.clone(), body.clone()));

        let on_or_after = body
            .pointer("/filter/last_edited_time/on_or_after")
            .and_then(Value::as_str);
        let matching: Vec<Value> = state
            .records
            .iter()
            .filter(|record| match on_or_after {
                Some(ts) => record
                    .get("last_edited_time")
                    .and_then(Value::as_str)
                    .is_some_and(|edited| edited >= ts),
                None => true,
            })
            .cloned()
            .collect();
        let page_size = body["page_size"].as_u64().unwrap_or(100) as usize;
        Ok(page_of(
            &matching,
            body.get("start_cursor").and_then(Value::as_str),
            page_size,
        ))
    }

    async fn list_block_children(
        &self,
        block_id: &str,
        start_cursor: Option<&str>,
        page_size: u32,
    ) -> Result<PaginatedResponse<Value>, AppError> {
        self.enter("blocks.children.list")?;
        let mut state = self.state.lock();
        state.listed_blocks.push(block_id.to_string());
        let children = state.blocks.get(block_id).cloned().unwrap_or_default();
        Ok(page_of(&children, start_cursor, page_size as usize))
    }

    async fn update_page(&self, page_id: &str, body: &Value) -> Result<Value, AppError> {
        self.enter("pages.update")?;
        self.state
            .lock()
            .updates
            .push((page_id.to_string(), body.clone()));
        Ok(json!({"object": "page", "id": page_id}))
    }

    async fn delete_block(&self, block_id: &str) -> Result<Value, AppError> {
        self.enter("blocks.delete")?;
        let mut state = self.state.lock();
        state.deleted.push(block_id.to_string());
        for children in state.blocks.values_mut() {
            children.retain(|child| child.get("id").and_then(Value::as_str) != Some(block_id));
        }
        Ok(json!({"object": "block", "id": block_id, "archived": true}))
    }

    async fn append_block_children(
        &self,
        block_id: &str,
        children: &[Value],
    ) -> Result<Value, AppError> {
        self.enter("blocks.children.append")?;
        self.state
            .lock()
            .appended
            .push((block_id.to_string(), children.len()));
        Ok(json!({"object": "list", "results": children}))
    }
}

/// A database whose schema lives on its first data source.
pub fn database_with_data_source(database_id: &str, data_source_id: &str) -> Value {
    json!({
        "object": "database",
        "id": database_id,
        "title": [{"plain_text": "Fixture"}],
        "properties": {},
        "data_sources": [{"id": data_source_id, "name": "Fixture"}]
    })
}

/// A database carrying its schema directly and no data sources.
pub fn legacy_database(database_id: &str) -> Value {
    json!({
        "object": "database",
        "id": database_id,
        "properties": schema_properties()
    })
}

pub fn data_source(data_source_id: &str) -> Value {
    json!({
        "object": "data_source",
        "id": data_source_id,
        "properties": schema_properties()
    })
}

pub fn schema_properties() -> Value {
    json!({
        "Name": {"id": "title", "type": "title", "title": {}},
        "Tags": {"id": "tags", "type": "multi_select", "multi_select": {}},
        "Related": {"id": "rel", "type": "relation", "relation": {}}
    })
}

/// A record with a title, one tag and relation targets.
pub fn record(id: &str, title: &str, last_edited_time: &str, related: &[&str]) -> Value {
    json!({
        "object": "page",
        "id": id,
        "url": format!("https://www.notion.so/{}", id.replace('-', "")),
        "created_time": "2025-12-01T00:00:00.000Z",
        "last_edited_time": last_edited_time,
        "archived": false,
        "properties": {
            "Name": {"id": "title", "type": "title", "title": [{"plain_text": title}]},
            "Tags": {"id": "tags", "type": "multi_select", "multi_select": [{"name": "rust"}]},
            "Related": {
                "id": "rel",
                "type": "relation",
                "relation": related.iter().map(|id| json!({"id": id})).collect::<Vec<_>>()
            }
        }
    })
}

pub fn paragraph(id: &str, text: &str, has_children: bool) -> Value {
    json!({
        "object": "block",
        "id": id,
        "type": "paragraph",
        "has_children": has_children,
        "paragraph": {"rich_text": [{"plain_text": text}]}
    })
}
