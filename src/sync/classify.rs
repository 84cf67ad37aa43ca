// src/sync/classify.rs
//! Change classification of freshly fetched records against what the store
//! held before the snapshot was written.

use crate::store::StoredRecord;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// Not stored before.
    Inserted,
    /// Stored with a different `last_edited_time`.
    Updated,
    /// Stored with the same `last_edited_time`; re-upserted but not a change.
    Unchanged,
}

impl ChangeKind {
    pub fn classify(previous: Option<&str>, current: Option<&str>) -> Self {
        let previous = previous.map(str::trim).unwrap_or_default();
        let current = current.map(str::trim).unwrap_or_default();
        if previous.is_empty() {
            ChangeKind::Inserted
        } else if previous != current {
            ChangeKind::Updated
        } else {
            ChangeKind::Unchanged
        }
    }
}

/// Summary of one changed record, as recorded in the `database_synced` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangedRecord {
    pub record_id: String,
    pub title: String,
    pub change_type: ChangeKind,
    pub last_edited_time: String,
}

/// The records that count as changed, in fetch order.
///
/// On a full replace every record is reported, whatever its classification.
pub fn changed_records(
    records: &[StoredRecord],
    previous_edit_times: &HashMap<String, String>,
    full_replace: bool,
) -> Vec<ChangedRecord> {
    records
        .iter()
        .filter_map(|record| {
            let kind = ChangeKind::classify(
                previous_edit_times.get(&record.record_id).map(String::as_str),
                record.last_edited_time.as_deref(),
            );
            (full_replace || kind != ChangeKind::Unchanged).then(|| ChangedRecord {
                record_id: record.record_id.clone(),
                title: record.title.clone(),
                change_type: kind,
                last_edited_time: record
                    .last_edited_time
                    .as_deref()
                    .unwrap_or_default()
                    .trim()
                    .to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, edited: Option<&str>) -> StoredRecord {
        StoredRecord {
            record_id: id.to_string(),
            logical_db: "resources".to_string(),
            database_id: "db".to_string(),
            title: id.to_uppercase(),
            property_text: String::new(),
            plain_text: String::new(),
            text_blob: String::new(),
            properties_json: "{}".to_string(),
            record_json: "{}".to_string(),
            url: String::new(),
            created_time: None,
            last_edited_time: edited.map(str::to_string),
            archived: false,
        }
    }

    #[test]
    fn classification() {
        assert_eq!(ChangeKind::classify(None, Some("t1")), ChangeKind::Inserted);
        assert_eq!(ChangeKind::classify(Some(""), Some("t1")), ChangeKind::Inserted);
        assert_eq!(ChangeKind::classify(Some("t1"), Some("t2")), ChangeKind::Updated);
        assert_eq!(ChangeKind::classify(Some("t1"), None), ChangeKind::Updated);
        assert_eq!(ChangeKind::classify(Some("t1"), Some(" t1 ")), ChangeKind::Unchanged);
    }

    #[test]
    fn incremental_skips_unchanged_records() {
        let records = vec![record("a", Some("t2")), record("b", Some("t1")), record("c", Some("t1"))];
        let previous = HashMap::from([
            ("a".to_string(), "t1".to_string()),
            ("b".to_string(), "t1".to_string()),
        ]);

        let changed = changed_records(&records, &previous, false);
        let kinds: Vec<_> = changed
            .iter()
            .map(|c| (c.record_id.as_str(), c.change_type))
            .collect();
        assert_eq!(
            kinds,
            vec![("a", ChangeKind::Updated), ("c", ChangeKind::Inserted)]
        );
    }

    #[test]
    fn full_replace_reports_every_record() {
        let records = vec![record("a", Some("t1")), record("b", None)];
        let previous = HashMap::from([("a".to_string(), "t1".to_string())]);

        let changed = changed_records(&records, &previous, true);
        assert_eq!(changed.len(), 2);
        assert_eq!(changed[0].change_type, ChangeKind::Unchanged);
        assert_eq!(changed[1].last_edited_time, "");
    }

    #[test]
    fn change_kind_serializes_snake_case() {
        let json = serde_json::to_value(ChangeKind::Unchanged).unwrap();
        assert_eq!(json, "unchanged");
    }
}
