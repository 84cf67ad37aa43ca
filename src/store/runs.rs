// src/store/runs.rs
//! Run and event logs: one table pair for sync runs, and one per review
//! workflow sharing the same shape.

use super::models::{
    ReviewEventRow, ReviewRunRow, ReviewRunTotals, ReviewWorkflow, RunStatus, SyncEventRow,
    SyncRunConfig, SyncRunRow, SyncRunTotals,
};
use super::{now_timestamp, parse_json_column, Store};
use crate::error::AppError;
use rusqlite::{params, OptionalExtension, Row};
use serde_json::Value;

const SYNC_RUN_COLUMNS: &str = "run_id, status, started_at, finished_at, incremental, \
     include_content, page_size, database_count, record_count, relation_count, changed_count, summary";

const REVIEW_RUN_COLUMNS: &str = "run_id, status, started_at, finished_at, target_count, \
     suggestion_count, needs_review_count, failure_count, summary";

impl Store {
    /// Opens a sync run in the `running` state and returns its id.
    pub fn create_sync_run(&self, config: &SyncRunConfig) -> Result<i64, AppError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO sync_runs (status, started_at, incremental, include_content, page_size)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                RunStatus::Running.as_str(),
                now_timestamp(),
                config.incremental,
                config.include_content,
                config.page_size
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn finish_sync_run(
        &self,
        run_id: i64,
        status: RunStatus,
        totals: &SyncRunTotals,
        summary: &str,
    ) -> Result<(), AppError> {
        let updated = self.conn.lock().execute(
            "UPDATE sync_runs SET status = ?1, finished_at = ?2, database_count = ?3,
               record_count = ?4, relation_count = ?5, changed_count = ?6, summary = ?7
             WHERE run_id = ?8",
            params![
                status.as_str(),
                now_timestamp(),
                totals.database_count as i64,
                totals.record_count as i64,
                totals.relation_count as i64,
                totals.changed_count as i64,
                summary,
                run_id
            ],
        )?;
        if updated == 0 {
            return Err(AppError::RunNotFound { run_id });
        }
        Ok(())
    }

    pub fn add_sync_event(
        &self,
        run_id: i64,
        logical_db: Option<&str>,
        step: &str,
        status: RunStatus,
        message: &str,
        detail: &Value,
    ) -> Result<(), AppError> {
        let detail_json = serde_json::to_string(detail)?;
        self.conn.lock().execute(
            "INSERT INTO sync_events (run_id, logical_db, step, status, message, detail_json, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                run_id,
                logical_db.unwrap_or(""),
                step,
                status.as_str(),
                message,
                detail_json,
                now_timestamp()
            ],
        )?;
        Ok(())
    }

    /// Sync runs, newest first.
    pub fn list_sync_runs(&self, limit: usize, offset: usize) -> Result<Vec<SyncRunRow>, AppError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {SYNC_RUN_COLUMNS} FROM sync_runs ORDER BY run_id DESC LIMIT ?1 OFFSET ?2"
        ))?;
        let rows = stmt.query_map(params![limit as i64, offset as i64], map_sync_run)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn get_sync_run(&self, run_id: i64) -> Result<Option<SyncRunRow>, AppError> {
        let conn = self.conn.lock();
        Ok(conn
            .query_row(
                &format!("SELECT {SYNC_RUN_COLUMNS} FROM sync_runs WHERE run_id = ?1"),
                params![run_id],
                map_sync_run,
            )
            .optional()?)
    }

    /// Events of one run in the order they were written, optionally for a
    /// single step.
    pub fn list_sync_events(
        &self,
        run_id: i64,
        step: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SyncEventRow>, AppError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT event_id, run_id, logical_db, step, status, message, detail_json, created_at
             FROM sync_events
             WHERE run_id = ?1 AND (?2 IS NULL OR step = ?2)
             ORDER BY event_id ASC
             LIMIT ?3",
        )?;
        let rows = stmt.query_map(params![run_id, step, limit as i64], |row| {
            Ok(SyncEventRow {
                event_id: row.get("event_id")?,
                run_id: row.get("run_id")?,
                logical_db: row.get("logical_db")?,
                step: row.get("step")?,
                status: row.get("status")?,
                message: row.get("message")?,
                detail: parse_json_column(&row.get::<_, String>("detail_json")?),
                created_at: row.get("created_at")?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn create_review_run(&self, workflow: ReviewWorkflow) -> Result<i64, AppError> {
        let conn = self.conn.lock();
        conn.execute(
            &format!(
                "INSERT INTO {} (status, started_at) VALUES (?1, ?2)",
                workflow.runs_table()
            ),
            params![RunStatus::Running.as_str(), now_timestamp()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn finish_review_run(
        &self,
        workflow: ReviewWorkflow,
        run_id: i64,
        status: RunStatus,
        totals: &ReviewRunTotals,
        summary: &str,
    ) -> Result<(), AppError> {
        let updated = self.conn.lock().execute(
            &format!(
                "UPDATE {} SET status = ?1, finished_at = ?2, target_count = ?3,
                   suggestion_count = ?4, needs_review_count = ?5, failure_count = ?6, summary = ?7
                 WHERE run_id = ?8",
                workflow.runs_table()
            ),
            params![
                status.as_str(),
                now_timestamp(),
                totals.target_count as i64,
                totals.suggestion_count as i64,
                totals.needs_review_count as i64,
                totals.failure_count as i64,
                summary,
                run_id
            ],
        )?;
        if updated == 0 {
            return Err(AppError::RunNotFound { run_id });
        }
        Ok(())
    }

    pub fn add_review_event(
        &self,
        workflow: ReviewWorkflow,
        run_id: i64,
        step: &str,
        status: RunStatus,
        message: &str,
        detail: &Value,
    ) -> Result<(), AppError> {
        let detail_json = serde_json::to_string(detail)?;
        self.conn.lock().execute(
            &format!(
                "INSERT INTO {} (run_id, step, status, message, detail_json, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                workflow.events_table()
            ),
            params![
                run_id,
                step,
                status.as_str(),
                message,
                detail_json,
                now_timestamp()
            ],
        )?;
        Ok(())
    }

    pub fn list_review_runs(
        &self,
        workflow: ReviewWorkflow,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<ReviewRunRow>, AppError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {REVIEW_RUN_COLUMNS} FROM {} ORDER BY run_id DESC LIMIT ?1 OFFSET ?2",
            workflow.runs_table()
        ))?;
        let rows = stmt.query_map(params![limit as i64, offset as i64], |row| {
            Ok(ReviewRunRow {
                run_id: row.get("run_id")?,
                status: row.get("status")?,
                started_at: row.get("started_at")?,
                finished_at: row.get("finished_at")?,
                target_count: row.get("target_count")?,
                suggestion_count: row.get("suggestion_count")?,
                needs_review_count: row.get("needs_review_count")?,
                failure_count: row.get("failure_count")?,
                summary: row.get("summary")?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn list_review_events(
        &self,
        workflow: ReviewWorkflow,
        run_id: i64,
    ) -> Result<Vec<ReviewEventRow>, AppError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT event_id, run_id, step, status, message, detail_json, created_at
             FROM {} WHERE run_id = ?1 ORDER BY event_id ASC",
            workflow.events_table()
        ))?;
        let rows = stmt.query_map(params![run_id], |row| {
            Ok(ReviewEventRow {
                event_id: row.get("event_id")?,
                run_id: row.get("run_id")?,
                step: row.get("step")?,
                status: row.get("status")?,
                message: row.get("message")?,
                detail: parse_json_column(&row.get::<_, String>("detail_json")?),
                created_at: row.get("created_at")?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

fn map_sync_run(row: &Row<'_>) -> rusqlite::Result<SyncRunRow> {
    Ok(SyncRunRow {
        run_id: row.get("run_id")?,
        status: row.get("status")?,
        started_at: row.get("started_at")?,
        finished_at: row.get("finished_at")?,
        incremental: row.get("incremental")?,
        include_content: row.get("include_content")?,
        page_size: row.get("page_size")?,
        database_count: row.get("database_count")?,
        record_count: row.get("record_count")?,
        relation_count: row.get("relation_count")?,
        changed_count: row.get("changed_count")?,
        summary: row.get("summary")?,
    })
}
