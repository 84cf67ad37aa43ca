// src/sync/mod.rs
//! The sync engine: pulls every configured database through a
//! `RemoteGateway` and writes it into the `Store`, one audited run at a time.
//!
//! Databases are processed sequentially in configuration order. Each one is
//! either fully replaced (nothing stored yet, or incremental mode off) or
//! synced incrementally from the newest stored `last_edited_time`. A failure
//! aborts the remaining databases; snapshots already committed stay.

mod classify;

pub use classify::{changed_records, ChangeKind, ChangedRecord};

use crate::api::RemoteGateway;
use crate::constants::{
    CHANGED_RECORDS_EVENT_CAP, DEFAULT_CONTENT_MAX_CHARS, DEFAULT_CONTENT_MAX_DEPTH,
    NOTION_API_PAGE_SIZE, SYNC_PROGRESS_INTERVAL,
};
use crate::error::AppError;
use crate::extract::{compose_text_blob, flatten_property_text, record_relations, record_title};
use crate::model::RemoteRecord;
use crate::store::{
    DatabaseSnapshot, RunStatus, Store, StoredRecord, SyncRunConfig, SyncRunTotals,
};
use crate::types::{LogicalDbName, NotionId};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::json;

/// Options of one sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncOptions {
    /// Fetch each record's body text.
    pub include_content: bool,
    pub content_max_chars: usize,
    pub content_max_depth: usize,
    pub page_size: u32,
    /// Pull only records edited since the stored watermark.
    pub incremental: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            include_content: true,
            content_max_chars: DEFAULT_CONTENT_MAX_CHARS,
            content_max_depth: DEFAULT_CONTENT_MAX_DEPTH,
            page_size: NOTION_API_PAGE_SIZE,
            incremental: true,
        }
    }
}

/// Result of a completed run: per logical database, how many records and
/// relations were written and how many records changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncStats {
    pub run_id: i64,
    pub databases: IndexMap<String, usize>,
    pub relations: IndexMap<String, usize>,
    pub changed: IndexMap<String, usize>,
}

impl SyncStats {
    pub fn totals(&self) -> SyncRunTotals {
        SyncRunTotals {
            database_count: self.databases.len(),
            record_count: self.databases.values().sum(),
            relation_count: self.relations.values().sum(),
            changed_count: self.changed.values().sum(),
        }
    }

    fn summary(&self) -> String {
        let totals = self.totals();
        format!(
            "Sync completed: {} databases, {} records, {} relations, {} changed",
            totals.database_count, totals.record_count, totals.relation_count, totals.changed_count
        )
    }
}

/// How one database was pulled.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SyncMode {
    Full,
    Incremental { edited_after: String },
}

impl SyncMode {
    fn plan(incremental: bool, watermark: Option<String>) -> Self {
        match watermark {
            Some(edited_after) if incremental => SyncMode::Incremental { edited_after },
            _ => SyncMode::Full,
        }
    }

    fn is_full_replace(&self) -> bool {
        matches!(self, SyncMode::Full)
    }

    fn edited_after(&self) -> Option<&str> {
        match self {
            SyncMode::Full => None,
            SyncMode::Incremental { edited_after } => Some(edited_after),
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            SyncMode::Full => "full",
            SyncMode::Incremental { .. } => "incremental",
        }
    }
}

pub struct SyncEngine<'a> {
    databases: &'a IndexMap<LogicalDbName, NotionId>,
    gateway: &'a dyn RemoteGateway,
    store: &'a Store,
}

impl<'a> SyncEngine<'a> {
    pub fn new(
        databases: &'a IndexMap<LogicalDbName, NotionId>,
        gateway: &'a dyn RemoteGateway,
        store: &'a Store,
    ) -> Self {
        Self {
            databases,
            gateway,
            store,
        }
    }

    /// Runs one sync over every configured database.
    ///
    /// On failure the run is finalized as `failed` with the totals reached so
    /// far, a `fatal` event records the error, and the error is returned.
    pub async fn run(&self, options: &SyncOptions) -> Result<SyncStats, AppError> {
        let run_id = self.store.create_sync_run(&SyncRunConfig {
            incremental: options.incremental,
            include_content: options.include_content,
            page_size: options.page_size,
        })?;
        let mut stats = SyncStats {
            run_id,
            ..SyncStats::default()
        };

        // From here on every error finalizes the run as failed.
        match self.execute(run_id, options, &mut stats).await {
            Ok(()) => Ok(stats),
            Err(err) => {
                self.record_failure(run_id, &stats, &err);
                Err(err)
            }
        }
    }

    async fn execute(
        &self,
        run_id: i64,
        options: &SyncOptions,
        stats: &mut SyncStats,
    ) -> Result<(), AppError> {
        self.store.add_sync_event(
            run_id,
            None,
            "start",
            RunStatus::Running,
            "Sync run started",
            &serde_json::to_value(options)?,
        )?;
        log::info!(
            "Sync started: run_id={} include_content={} content_max_chars={} content_max_depth={} page_size={} incremental={}",
            run_id,
            options.include_content,
            options.content_max_chars,
            options.content_max_depth,
            options.page_size,
            options.incremental
        );

        self.sync_all(run_id, options, stats).await?;
        self.complete_run(run_id, stats)
    }

    fn complete_run(&self, run_id: i64, stats: &SyncStats) -> Result<(), AppError> {
        let summary = stats.summary();
        self.store.add_sync_event(
            run_id,
            None,
            "finish",
            RunStatus::Completed,
            &summary,
            &json!({
                "databases": stats.databases,
                "relations": stats.relations,
                "changed": stats.changed,
            }),
        )?;
        self.store
            .finish_sync_run(run_id, RunStatus::Completed, &stats.totals(), &summary)?;
        log::info!(
            "Sync finished: run_id={} databases={:?} relations={:?} changed={:?}",
            run_id,
            stats.databases,
            stats.relations,
            stats.changed
        );
        Ok(())
    }

    async fn sync_all(
        &self,
        run_id: i64,
        options: &SyncOptions,
        stats: &mut SyncStats,
    ) -> Result<(), AppError> {
        for (logical_db, database_id) in self.databases {
            self.sync_database(run_id, logical_db.as_str(), database_id, options, stats)
                .await?;
        }
        Ok(())
    }

    async fn sync_database(
        &self,
        run_id: i64,
        logical_db: &str,
        database_id: &NotionId,
        options: &SyncOptions,
        stats: &mut SyncStats,
    ) -> Result<(), AppError> {
        log::info!(
            "Pulling schema: logical_db={} database_id={}",
            logical_db,
            database_id
        );
        let schema = self.gateway.fetch_schema(database_id).await?;
        let title_property = schema.title_property(logical_db)?;

        let watermark = if options.incremental {
            self.store.latest_record_edited_time(logical_db)?
        } else {
            None
        };
        let mode = SyncMode::plan(options.incremental, watermark);
        match mode.edited_after() {
            Some(edited_after) => log::info!(
                "Pulling records incrementally: logical_db={} on_or_after={}",
                logical_db,
                edited_after
            ),
            None => log::info!("Pulling full snapshot: logical_db={}", logical_db),
        }

        let remote = self
            .gateway
            .query_all_records(database_id, options.page_size, mode.edited_after())
            .await?;
        let ids: Vec<String> = remote.iter().map(|record| record.id.clone()).collect();
        let previous_edit_times = self.store.record_edit_times(logical_db, &ids)?;

        let mut records = Vec::with_capacity(remote.len());
        let mut relations = Vec::new();
        for (index, record) in remote.iter().enumerate() {
            let plain_text = if options.include_content {
                self.gateway
                    .fetch_record_plain_text(
                        &record.id,
                        options.content_max_chars,
                        options.content_max_depth,
                    )
                    .await?
            } else {
                String::new()
            };
            records.push(stored_record(
                record,
                logical_db,
                database_id,
                &title_property,
                plain_text,
            )?);
            relations.extend(record_relations(record, logical_db));

            let processed = index + 1;
            if processed % SYNC_PROGRESS_INTERVAL == 0 {
                log::info!(
                    "Sync progress: logical_db={} processed={} total={}",
                    logical_db,
                    processed,
                    remote.len()
                );
            }
        }

        let changed = changed_records(&records, &previous_edit_times, mode.is_full_replace());
        let (record_count, relation_count, changed_count) =
            (records.len(), relations.len(), changed.len());

        self.store.upsert_database_snapshot(
            &DatabaseSnapshot {
                logical_db: logical_db.to_string(),
                database_id: database_id.to_string(),
                title_property,
                schema_json: schema.merged_json(),
                records,
                relations,
            },
            mode.is_full_replace(),
        )?;

        stats.databases.insert(logical_db.to_string(), record_count);
        stats.relations.insert(logical_db.to_string(), relation_count);
        stats.changed.insert(logical_db.to_string(), changed_count);
        log::info!(
            "Sync completed for database: logical_db={} records={} relations={} changed={}",
            logical_db,
            record_count,
            relation_count,
            changed_count
        );

        let reported = &changed[..changed_count.min(CHANGED_RECORDS_EVENT_CAP)];
        self.store.add_sync_event(
            run_id,
            Some(logical_db),
            "database_synced",
            RunStatus::Completed,
            &format!(
                "{} synced: {} records, {} relations, {} changed",
                logical_db, record_count, relation_count, changed_count
            ),
            &json!({
                "mode": mode.as_str(),
                "last_edited_after": mode.edited_after().unwrap_or_default(),
                "page_count": record_count,
                "relation_count": relation_count,
                "changed_count": changed_count,
                "changed_pages": reported,
                "omitted_changed_pages": changed_count - reported.len(),
            }),
        )?;
        Ok(())
    }

    /// Best effort: a failure while recording the failure is only logged.
    fn record_failure(&self, run_id: i64, stats: &SyncStats, err: &AppError) {
        let message = err.to_string();
        log::error!("Sync failed: run_id={} error={}", run_id, message);
        if let Err(log_err) = self.store.add_sync_event(
            run_id,
            None,
            "fatal",
            RunStatus::Failed,
            &message,
            &json!({}),
        ) {
            log::error!("Could not record fatal event for run {}: {}", run_id, log_err);
        }
        if let Err(log_err) =
            self.store
                .finish_sync_run(run_id, RunStatus::Failed, &stats.totals(), &message)
        {
            log::error!("Could not mark run {} as failed: {}", run_id, log_err);
        }
    }
}

fn stored_record(
    record: &RemoteRecord,
    logical_db: &str,
    database_id: &NotionId,
    title_property: &str,
    plain_text: String,
) -> Result<StoredRecord, AppError> {
    let title = record_title(record, title_property);
    let property_text = flatten_property_text(&record.properties);
    Ok(StoredRecord {
        record_id: record.id.clone(),
        logical_db: logical_db.to_string(),
        database_id: database_id.to_string(),
        text_blob: compose_text_blob(&title, &property_text, &plain_text),
        properties_json: serde_json::to_string(&record.raw_properties())?,
        record_json: serde_json::to_string(&record.raw)?,
        url: record.url.clone(),
        created_time: record.created_time.clone(),
        last_edited_time: record.last_edited_time.clone(),
        archived: record.archived,
        title,
        property_text,
        plain_text,
    })
}
