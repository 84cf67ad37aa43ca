//! Rows written to and read from the local store.

use crate::model::RelationEdge;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// A record as mirrored locally, ready to upsert.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredRecord {
    pub record_id: String,
    pub logical_db: String,
    pub database_id: String,
    pub title: String,
    pub property_text: String,
    pub plain_text: String,
    pub text_blob: String,
    pub properties_json: String,
    pub record_json: String,
    pub url: String,
    pub created_time: Option<String>,
    pub last_edited_time: Option<String>,
    pub archived: bool,
}

/// A stored record together with the time it was last written locally.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordRow {
    #[serde(flatten)]
    pub record: StoredRecord,
    pub synced_at: String,
}

/// Everything one database contributes to a sync, written in one transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseSnapshot {
    pub logical_db: String,
    pub database_id: String,
    pub title_property: String,
    pub schema_json: Value,
    pub records: Vec<StoredRecord>,
    pub relations: Vec<RelationEdge>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogicalDatabaseRow {
    pub logical_db: String,
    pub database_id: String,
    pub title_property: String,
    pub schema_json: Value,
    pub synced_at: String,
}

/// Per-database overview used by `list_database_snapshots`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatabaseSnapshotSummary {
    pub logical_db: String,
    pub database_id: String,
    pub title_property: String,
    pub synced_at: String,
    pub record_count: i64,
    pub latest_record_edited_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationRow {
    #[serde(flatten)]
    pub edge: RelationEdge,
    pub synced_at: String,
}

/// Outgoing edges of a logical database: record -> property -> targets.
pub type RelationMap = BTreeMap<String, BTreeMap<String, std::collections::BTreeSet<String>>>;

/// Lifecycle of a run, also used as the status of its events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }
}

/// Options a sync run was started with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncRunConfig {
    pub incremental: bool,
    pub include_content: bool,
    pub page_size: u32,
}

/// Aggregate counts written when a run is finalized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncRunTotals {
    pub database_count: usize,
    pub record_count: usize,
    pub relation_count: usize,
    pub changed_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncRunRow {
    pub run_id: i64,
    pub status: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub incremental: bool,
    pub include_content: bool,
    pub page_size: i64,
    pub database_count: i64,
    pub record_count: i64,
    pub relation_count: i64,
    pub changed_count: i64,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncEventRow {
    pub event_id: i64,
    pub run_id: i64,
    pub logical_db: String,
    pub step: String,
    pub status: String,
    pub message: String,
    pub detail: Value,
    pub created_at: String,
}

/// Record and relation counts per logical database.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoreStats {
    pub records: BTreeMap<String, i64>,
    pub relations: BTreeMap<String, i64>,
}

/// The downstream review workflows that keep their own run logs in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewWorkflow {
    /// Error-log enrichment suggestions (`workflow_*`, `agent_suggestions`).
    ErrorEnrichment,
    /// Knowledge-page suggestions (`knowledge_*`).
    Knowledge,
}

impl ReviewWorkflow {
    pub(crate) fn runs_table(&self) -> &'static str {
        match self {
            ReviewWorkflow::ErrorEnrichment => "workflow_runs",
            ReviewWorkflow::Knowledge => "knowledge_runs",
        }
    }

    pub(crate) fn events_table(&self) -> &'static str {
        match self {
            ReviewWorkflow::ErrorEnrichment => "workflow_events",
            ReviewWorkflow::Knowledge => "knowledge_events",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReviewRunTotals {
    pub target_count: usize,
    pub suggestion_count: usize,
    pub needs_review_count: usize,
    pub failure_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewRunRow {
    pub run_id: i64,
    pub status: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub target_count: i64,
    pub suggestion_count: i64,
    pub needs_review_count: i64,
    pub failure_count: i64,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewEventRow {
    pub event_id: i64,
    pub run_id: i64,
    pub step: String,
    pub status: String,
    pub message: String,
    pub detail: Value,
    pub created_at: String,
}
