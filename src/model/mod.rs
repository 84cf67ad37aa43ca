//! The remote objects the mirror reads (records with typed properties,
//! database schemas, content blocks) and the relation edges derived from them.

mod block;
mod property_value;
mod schema;

pub use block::{BlockNode, BlockText};
pub use property_value::{
    DateRange, FormulaValue, PropertyValue, RelationRef, RichTextRun, SelectOption,
};
pub use schema::{DatabaseSchema, SchemaResolution, SchemaSource};

use crate::error::AppError;
use indexmap::IndexMap;
use serde_json::Value;

/// A record ("page") returned by a database query.
///
/// The typed `properties` drive extraction; `raw` is kept untouched so the
/// store can persist the payload exactly as the API sent it.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteRecord {
    pub id: String,
    pub url: String,
    pub created_time: Option<String>,
    pub last_edited_time: Option<String>,
    pub archived: bool,
    pub properties: IndexMap<String, PropertyValue>,
    pub raw: Value,
}

impl RemoteRecord {
    pub fn from_json(raw: Value) -> Result<Self, AppError> {
        let id = raw
            .get("id")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::MalformedResponse("record without an id".to_string()))?
            .to_string();

        let properties = raw
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| {
                props
                    .iter()
                    .map(|(name, value)| (name.clone(), PropertyValue::from_json(name, value)))
                    .collect()
            })
            .unwrap_or_default();

        let text_field = |key: &str| {
            raw.get(key)
                .and_then(Value::as_str)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };

        Ok(Self {
            url: text_field("url").unwrap_or_default(),
            created_time: text_field("created_time"),
            last_edited_time: text_field("last_edited_time"),
            archived: raw.get("archived").and_then(Value::as_bool).unwrap_or(false),
            id,
            properties,
            raw,
        })
    }

    /// The raw `properties` object, or an empty object when absent.
    pub fn raw_properties(&self) -> Value {
        self.raw
            .get("properties")
            .cloned()
            .unwrap_or_else(|| Value::Object(Default::default()))
    }
}

/// A directed, typed link from one record to another.
///
/// Unique on `(from_record_id, property_name, to_record_id)`. The target may
/// live in another logical database or not be mirrored at all.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct RelationEdge {
    pub from_record_id: String,
    pub from_logical_db: String,
    pub property_name: String,
    pub to_record_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_fields_and_property_order_are_kept() {
        let record = RemoteRecord::from_json(json!({
            "id": "r1",
            "url": " https://notion.so/r1 ",
            "last_edited_time": "2026-01-02T00:00:00.000Z",
            "archived": true,
            "properties": {
                "Zeta": {"type": "checkbox", "checkbox": true},
                "Alpha": {"type": "url", "url": "x"}
            }
        }))
        .unwrap();

        assert_eq!(record.url, "https://notion.so/r1");
        assert!(record.archived);
        assert_eq!(record.created_time, None);
        let names: Vec<_> = record.properties.keys().cloned().collect();
        assert_eq!(names, vec!["Zeta", "Alpha"]);
    }

    #[test]
    fn records_need_an_id() {
        assert!(RemoteRecord::from_json(json!({"properties": {}})).is_err());
    }
}
