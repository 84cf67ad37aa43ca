// src/lib.rs
//! notion-sync library — mirrors Notion databases into a local SQLite store.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Error handling** — `AppError`, `NotionErrorCode`, `ValidationError`
//! - **Configuration** — `AppConfig`, `Cli`
//! - **Domain model** — `RemoteRecord`, `PropertyValue`, `DatabaseSchema`, `RelationEdge`
//! - **Domain types** — `NotionId`, `ApiKey`, `LogicalDbName`
//! - **API client** — `NotionHttpClient`, `NotionGateway`, `NotionTransport`, `RemoteGateway`
//! - **Store** — `Store` and its row types
//! - **Sync** — `SyncEngine`, `SyncOptions`, `SyncStats`

pub mod api;
pub mod config;
pub mod constants;
pub mod error;
pub mod error_recovery;
pub mod extract;
pub mod model;
pub mod pipeline;
pub mod store;
pub mod sync;
pub mod types;

// --- Error Handling ---
pub use crate::error::{AppError, NotionErrorCode};
pub use crate::types::ValidationError;

// --- Configuration ---
pub use crate::config::{AppConfig, Cli, Command, SyncArgs};

// --- Domain Model ---
pub use crate::model::{
    BlockNode, DatabaseSchema, PropertyValue, RelationEdge, RemoteRecord, SchemaResolution,
};

// --- Domain Types ---
pub use crate::types::{ApiKey, LogicalDbName, NotionId};

// --- API Client ---
pub use crate::api::{
    NotionGateway, NotionHttpClient, NotionTransport, PaginatedResponse, QueryTarget,
    RemoteGateway,
};
pub use crate::error_recovery::RetryPolicy;
pub use crate::pipeline::BlockRenderer;

// --- Store ---
pub use crate::store::{RunStatus, Store, StoredRecord};

// --- Sync ---
pub use crate::sync::{ChangeKind, SyncEngine, SyncOptions, SyncStats};
