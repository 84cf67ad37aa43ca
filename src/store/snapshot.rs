// src/store/snapshot.rs
//! Writing one logical database's snapshot, and the edit-time reads the
//! sync engine uses to plan and classify the next one.

use super::models::DatabaseSnapshot;
use super::{now_timestamp, Store};
use crate::constants::STORE_ID_BATCH_SIZE;
use crate::error::AppError;
use rusqlite::{params, params_from_iter, OptionalExtension};
use std::collections::HashMap;

impl Store {
    /// Writes a database snapshot atomically.
    ///
    /// With `full_replace`, every record and outgoing relation previously
    /// stored for the logical database is dropped first. Otherwise only the
    /// supplied records are upserted, and the outgoing relations of exactly
    /// those records are replaced; everything else is left alone.
    pub fn upsert_database_snapshot(
        &self,
        snapshot: &DatabaseSnapshot,
        full_replace: bool,
    ) -> Result<(), AppError> {
        let synced_at = now_timestamp();
        let schema_json = serde_json::to_string(&snapshot.schema_json)?;
        let logical_db = snapshot.logical_db.as_str();

        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO logical_databases (logical_db, database_id, title_property, schema_json, synced_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(logical_db) DO UPDATE SET
               database_id = excluded.database_id,
               title_property = excluded.title_property,
               schema_json = excluded.schema_json,
               synced_at = excluded.synced_at",
            params![
                logical_db,
                snapshot.database_id,
                snapshot.title_property,
                schema_json,
                synced_at
            ],
        )?;

        if full_replace {
            tx.execute(
                "DELETE FROM relations WHERE from_logical_db = ?1",
                params![logical_db],
            )?;
            tx.execute(
                "DELETE FROM records WHERE logical_db = ?1",
                params![logical_db],
            )?;
        }

        {
            let mut upsert = tx.prepare(
                "INSERT INTO records (
                   record_id, logical_db, database_id, title, property_text, plain_text,
                   text_blob, properties_json, record_json, url, created_time,
                   last_edited_time, archived, synced_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
                 ON CONFLICT(record_id) DO UPDATE SET
                   logical_db = excluded.logical_db,
                   database_id = excluded.database_id,
                   title = excluded.title,
                   property_text = excluded.property_text,
                   plain_text = excluded.plain_text,
                   text_blob = excluded.text_blob,
                   properties_json = excluded.properties_json,
                   record_json = excluded.record_json,
                   url = excluded.url,
                   created_time = excluded.created_time,
                   last_edited_time = excluded.last_edited_time,
                   archived = excluded.archived,
                   synced_at = excluded.synced_at",
            )?;
            for record in &snapshot.records {
                upsert.execute(params![
                    record.record_id,
                    logical_db,
                    record.database_id,
                    record.title,
                    record.property_text,
                    record.plain_text,
                    record.text_blob,
                    record.properties_json,
                    record.record_json,
                    record.url,
                    record.created_time,
                    record.last_edited_time,
                    record.archived,
                    synced_at
                ])?;
            }
        }

        if !full_replace {
            let mut clear = tx.prepare(
                "DELETE FROM relations WHERE from_logical_db = ?1 AND from_record_id = ?2",
            )?;
            for record in &snapshot.records {
                clear.execute(params![logical_db, record.record_id])?;
            }
        }

        {
            let mut insert = tx.prepare(
                "INSERT INTO relations (from_record_id, from_logical_db, property_name, to_record_id, synced_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(from_record_id, property_name, to_record_id) DO UPDATE SET
                   from_logical_db = excluded.from_logical_db,
                   synced_at = excluded.synced_at",
            )?;
            for edge in &snapshot.relations {
                insert.execute(params![
                    edge.from_record_id,
                    edge.from_logical_db,
                    edge.property_name,
                    edge.to_record_id,
                    synced_at
                ])?;
            }
        }

        tx.commit()?;
        log::debug!(
            "Stored snapshot of {}: {} records, {} relations (full_replace={})",
            logical_db,
            snapshot.records.len(),
            snapshot.relations.len(),
            full_replace
        );
        Ok(())
    }

    /// Maximum stored `last_edited_time` of a logical database; `None` when
    /// nothing has been stored yet.
    pub fn latest_record_edited_time(&self, logical_db: &str) -> Result<Option<String>, AppError> {
        let conn = self.conn.lock();
        let latest: Option<Option<String>> = conn
            .query_row(
                "SELECT MAX(last_edited_time) FROM records WHERE logical_db = ?1",
                params![logical_db],
                |row| row.get(0),
            )
            .optional()?;
        Ok(latest.flatten().filter(|ts| !ts.is_empty()))
    }

    /// Stored `last_edited_time` for each of `record_ids` that is present.
    pub fn record_edit_times(
        &self,
        logical_db: &str,
        record_ids: &[String],
    ) -> Result<HashMap<String, String>, AppError> {
        let mut found = HashMap::new();
        if record_ids.is_empty() {
            return Ok(found);
        }

        let conn = self.conn.lock();
        for batch in record_ids.chunks(STORE_ID_BATCH_SIZE) {
            let placeholders = (0..batch.len())
                .map(|i| format!("?{}", i + 2))
                .collect::<Vec<_>>()
                .join(", ");
            let sql = format!(
                "SELECT record_id, last_edited_time FROM records
                 WHERE logical_db = ?1 AND record_id IN ({placeholders})"
            );
            let mut stmt = conn.prepare(&sql)?;
            let args = std::iter::once(logical_db).chain(batch.iter().map(String::as_str));
            let rows = stmt.query_map(params_from_iter(args), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
            })?;
            for row in rows {
                let (record_id, edited) = row?;
                if let Some(edited) = edited.filter(|ts| !ts.is_empty()) {
                    found.insert(record_id, edited);
                }
            }
        }
        Ok(found)
    }
}
