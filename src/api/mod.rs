//! Notion API interaction — reading databases, records and content, and
//! writing record properties and content back.
//!
//! Two seams keep the sync engine independent of HTTP:
//! `NotionTransport` is one call per API endpoint, with no retry or
//! pagination; `RemoteGateway` is what the sync engine consumes, and
//! `NotionGateway` implements it on top of any transport.

mod block_walk;
pub mod client;
pub mod gateway;
pub mod parser;
mod simple_pagination;
pub mod types;

use crate::error::AppError;
use crate::model::{DatabaseSchema, RemoteRecord};
use crate::types::NotionId;
use serde_json::Value;

pub use block_walk::collect_plain_text;
pub use client::NotionHttpClient;
pub use gateway::NotionGateway;
pub use simple_pagination::fetch_all_pages;
pub use types::{
    last_edited_filter, ContentReplacement, PaginatedResponse, QueryTarget, RecordQuery,
};

/// Single requests against the Notion API endpoints the mirror uses.
#[async_trait::async_trait]
pub trait NotionTransport: Send + Sync {
    async fn retrieve_database(&self, database_id: &str) -> Result<Value, AppError>;
    async fn retrieve_data_source(&self, data_source_id: &str) -> Result<Value, AppError>;
    async fn query_records(
        &self,
        target: &QueryTarget,
        body: &Value,
    ) -> Result<PaginatedResponse<Value>, AppError>;
    async fn list_block_children(
        &self,
        block_id: &str,
        start_cursor: Option<&str>,
        page_size: u32,
    ) -> Result<PaginatedResponse<Value>, AppError>;
    async fn update_page(&self, page_id: &str, body: &Value) -> Result<Value, AppError>;
    async fn delete_block(&self, block_id: &str) -> Result<Value, AppError>;
    async fn append_block_children(
        &self,
        block_id: &str,
        children: &[Value],
    ) -> Result<Value, AppError>;
}

/// The remote operations a sync run and the write path depend on.
///
/// Every call is retried on transient API errors; list operations are
/// followed to exhaustion.
#[async_trait::async_trait]
pub trait RemoteGateway: Send + Sync {
    /// The database object and where its property schema was found.
    async fn fetch_schema(&self, database_id: &NotionId) -> Result<DatabaseSchema, AppError>;

    /// All records of a database, in API order. With `edited_after`, only
    /// records whose `last_edited_time` is on or after it.
    async fn query_all_records(
        &self,
        database_id: &NotionId,
        page_size: u32,
        edited_after: Option<&str>,
    ) -> Result<Vec<RemoteRecord>, AppError>;

    /// Plain text of a record's content, depth- and length-bounded.
    async fn fetch_record_plain_text(
        &self,
        record_id: &str,
        max_chars: usize,
        max_depth: usize,
    ) -> Result<String, AppError>;

    async fn update_record_properties(
        &self,
        record_id: &str,
        properties: &Value,
    ) -> Result<Value, AppError>;

    /// Deletes all top-level content blocks, then appends `blocks`.
    /// Not atomic: a failure part-way leaves the record partially cleared.
    async fn replace_record_content(
        &self,
        record_id: &str,
        blocks: &[Value],
    ) -> Result<ContentReplacement, AppError>;
}
