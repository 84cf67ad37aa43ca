// src/store/queries.rs
//! Read accessors over the mirrored databases, records and relations.

use super::models::{
    DatabaseSnapshotSummary, LogicalDatabaseRow, RecordRow, RelationMap, RelationRow, StoreStats,
    StoredRecord,
};
use super::{parse_json_column, Store};
use crate::error::AppError;
use crate::model::RelationEdge;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeMap;

const RECORD_COLUMNS: &str = "record_id, logical_db, database_id, title, property_text, \
     plain_text, text_blob, properties_json, record_json, url, created_time, last_edited_time, \
     archived, synced_at";

impl Store {
    pub fn get_logical_database(
        &self,
        logical_db: &str,
    ) -> Result<Option<LogicalDatabaseRow>, AppError> {
        let conn = self.conn.lock();
        Ok(conn
            .query_row(
                "SELECT logical_db, database_id, title_property, schema_json, synced_at
                 FROM logical_databases WHERE logical_db = ?1",
                params![logical_db],
                |row| {
                    Ok(LogicalDatabaseRow {
                        logical_db: row.get("logical_db")?,
                        database_id: row.get("database_id")?,
                        title_property: row.get("title_property")?,
                        schema_json: parse_json_column(&row.get::<_, String>("schema_json")?),
                        synced_at: row.get("synced_at")?,
                    })
                },
            )
            .optional()?)
    }

    /// Every stored logical database with its record count and newest edit.
    pub fn list_database_snapshots(&self) -> Result<Vec<DatabaseSnapshotSummary>, AppError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT d.logical_db, d.database_id, d.title_property, d.synced_at,
                    COUNT(r.record_id) AS record_count,
                    MAX(r.last_edited_time) AS latest_record_edited_time
             FROM logical_databases d
             LEFT JOIN records r ON r.logical_db = d.logical_db
             GROUP BY d.logical_db
             ORDER BY d.logical_db",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(DatabaseSnapshotSummary {
                logical_db: row.get("logical_db")?,
                database_id: row.get("database_id")?,
                title_property: row.get("title_property")?,
                synced_at: row.get("synced_at")?,
                record_count: row.get("record_count")?,
                latest_record_edited_time: row.get("latest_record_edited_time")?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Records of a logical database ordered by title, case-insensitively.
    pub fn get_records(&self, logical_db: &str) -> Result<Vec<RecordRow>, AppError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM records WHERE logical_db = ?1
             ORDER BY LOWER(title), record_id"
        ))?;
        let rows = stmt.query_map(params![logical_db], map_record)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn get_record(&self, record_id: &str) -> Result<Option<RecordRow>, AppError> {
        let conn = self.conn.lock();
        Ok(conn
            .query_row(
                &format!("SELECT {RECORD_COLUMNS} FROM records WHERE record_id = ?1"),
                params![record_id],
                map_record,
            )
            .optional()?)
    }

    /// Title matches, shortest titles first.
    pub fn search_records_by_title(
        &self,
        logical_db: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<RecordRow>, AppError> {
        let pattern = format!("%{}%", escape_like(query.trim()));
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM records
             WHERE logical_db = ?1 AND title LIKE ?2 ESCAPE '\\'
             ORDER BY LENGTH(title), LOWER(title)
             LIMIT ?3"
        ))?;
        let rows = stmt.query_map(params![logical_db, pattern, limit as i64], map_record)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn relations_from(&self, record_id: &str) -> Result<Vec<RelationRow>, AppError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT from_record_id, from_logical_db, property_name, to_record_id, synced_at
             FROM relations WHERE from_record_id = ?1
             ORDER BY property_name, to_record_id",
        )?;
        let rows = stmt.query_map(params![record_id], map_relation)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Edges pointing at `record_id`, optionally only from one logical database.
    pub fn relations_to(
        &self,
        record_id: &str,
        from_logical_db: Option<&str>,
    ) -> Result<Vec<RelationRow>, AppError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT from_record_id, from_logical_db, property_name, to_record_id, synced_at
             FROM relations
             WHERE to_record_id = ?1 AND (?2 IS NULL OR from_logical_db = ?2)
             ORDER BY from_logical_db, from_record_id, property_name",
        )?;
        let rows = stmt.query_map(params![record_id, from_logical_db], map_relation)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Outgoing edges of a logical database grouped by record and property.
    pub fn relation_map(&self, logical_db: &str) -> Result<RelationMap, AppError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT from_record_id, property_name, to_record_id
             FROM relations WHERE from_logical_db = ?1",
        )?;
        let rows = stmt.query_map(params![logical_db], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut map = RelationMap::new();
        for row in rows {
            let (from, property, to) = row?;
            map.entry(from).or_default().entry(property).or_default().insert(to);
        }
        Ok(map)
    }

    /// Record and outgoing relation counts per logical database.
    pub fn stats(&self) -> Result<StoreStats, AppError> {
        let conn = self.conn.lock();
        Ok(StoreStats {
            records: count_by(
                &conn,
                "SELECT logical_db, COUNT(*) FROM records GROUP BY logical_db",
            )?,
            relations: count_by(
                &conn,
                "SELECT from_logical_db, COUNT(*) FROM relations GROUP BY from_logical_db",
            )?,
        })
    }
}

/// Makes `%`, `_` and `\` match literally under `LIKE ... ESCAPE '\'`.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn count_by(conn: &Connection, sql: &str) -> rusqlite::Result<BTreeMap<String, i64>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
    rows.collect()
}

fn map_record(row: &Row<'_>) -> rusqlite::Result<RecordRow> {
    Ok(RecordRow {
        record: StoredRecord {
            record_id: row.get("record_id")?,
            logical_db: row.get("logical_db")?,
            database_id: row.get("database_id")?,
            title: row.get("title")?,
            property_text: row.get("property_text")?,
            plain_text: row.get("plain_text")?,
            text_blob: row.get("text_blob")?,
            properties_json: row.get("properties_json")?,
            record_json: row.get("record_json")?,
            url: row.get("url")?,
            created_time: row.get("created_time")?,
            last_edited_time: row.get("last_edited_time")?,
            archived: row.get("archived")?,
        },
        synced_at: row.get("synced_at")?,
    })
}

fn map_relation(row: &Row<'_>) -> rusqlite::Result<RelationRow> {
    Ok(RelationRow {
        edge: RelationEdge {
            from_record_id: row.get("from_record_id")?,
            from_logical_db: row.get("from_logical_db")?,
            property_name: row.get("property_name")?,
            to_record_id: row.get("to_record_id")?,
        },
        synced_at: row.get("synced_at")?,
    })
}
