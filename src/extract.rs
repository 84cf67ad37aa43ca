// src/extract.rs
//! Pure mapping from a remote record to the text and edges the store keeps.
//!
//! Nothing here touches the network or the database: given a record and the
//! name of its title property, these functions produce the display title,
//! the flattened `name:value` property text, and the outgoing relations.

use crate::model::{FormulaValue, PropertyValue, RelationEdge, RemoteRecord, RichTextRun};
use indexmap::IndexMap;
use serde_json::Value;

/// First property whose schema `type` is `title`, in schema order.
pub fn first_title_property(schema: &IndexMap<String, Value>) -> Option<String> {
    schema
        .iter()
        .find(|(_, prop)| prop.get("type").and_then(Value::as_str) == Some("title"))
        .map(|(name, _)| name.clone())
}

/// Display title: the title property's runs concatenated and trimmed.
/// Empty when the property is absent or not a title.
pub fn record_title(record: &RemoteRecord, title_property: &str) -> String {
    match record.properties.get(title_property) {
        Some(PropertyValue::Title { title }) => join_runs(title, "").trim().to_string(),
        _ => String::new(),
    }
}

/// Renders one property value as searchable text.
pub fn property_text(value: &PropertyValue) -> String {
    match value {
        PropertyValue::Title { title: runs } | PropertyValue::RichText { rich_text: runs } => {
            join_runs(runs, " ").trim().to_string()
        }
        PropertyValue::Number { number } => {
            number.as_ref().map(ToString::to_string).unwrap_or_default()
        }
        PropertyValue::Url { url: text }
        | PropertyValue::Email { email: text }
        | PropertyValue::PhoneNumber {
            phone_number: text,
        } => trimmed(text.as_deref()),
        PropertyValue::Select { select: option } | PropertyValue::Status { status: option } => {
            trimmed(option.as_ref().and_then(|o| o.name.as_deref()))
        }
        PropertyValue::MultiSelect { multi_select } => multi_select
            .iter()
            .filter_map(|o| o.name.as_deref())
            .filter(|name| !name.is_empty())
            .map(str::trim)
            .collect::<Vec<_>>()
            .join(" "),
        PropertyValue::Date { date } => {
            let start = trimmed(date.as_ref().and_then(|d| d.start.as_deref()));
            let end = trimmed(date.as_ref().and_then(|d| d.end.as_deref()));
            if !start.is_empty() && !end.is_empty() {
                format!("{} {}", start, end)
            } else {
                start
            }
        }
        PropertyValue::Checkbox { checkbox } => bool_text(*checkbox),
        PropertyValue::Formula { formula } => match formula {
            Some(FormulaValue::String { string }) => trimmed(string.as_deref()),
            Some(FormulaValue::Number { number }) => {
                number.as_ref().map(ToString::to_string).unwrap_or_default()
            }
            Some(FormulaValue::Boolean { boolean }) => bool_text(boolean.unwrap_or(false)),
            Some(FormulaValue::Date { date }) => {
                trimmed(date.as_ref().and_then(|d| d.start.as_deref()))
            }
            Some(FormulaValue::Other) | None => String::new(),
        },
        PropertyValue::Relation { relation } => relation
            .iter()
            .filter(|r| !r.id.is_empty())
            .map(|r| r.id.as_str())
            .collect::<Vec<_>>()
            .join(" "),
        PropertyValue::Unsupported => String::new(),
    }
}

/// One `name:value` line per non-relation property with non-empty text,
/// in property order.
pub fn flatten_property_text(properties: &IndexMap<String, PropertyValue>) -> String {
    properties
        .iter()
        .filter(|(_, value)| !matches!(value, PropertyValue::Relation { .. }))
        .filter_map(|(name, value)| {
            let text = property_text(value);
            (!text.is_empty()).then(|| format!("{}:{}", name, text))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// One edge per linked target of every relation property.
pub fn record_relations(record: &RemoteRecord, logical_db: &str) -> Vec<RelationEdge> {
    record
        .properties
        .iter()
        .filter_map(|(name, value)| match value {
            PropertyValue::Relation { relation } => Some((name, relation)),
            _ => None,
        })
        .flat_map(|(name, relation)| {
            relation
                .iter()
                .filter(|target| !target.id.trim().is_empty())
                .map(move |target| RelationEdge {
                    from_record_id: record.id.clone(),
                    from_logical_db: logical_db.to_string(),
                    property_name: name.clone(),
                    to_record_id: target.id.trim().to_string(),
                })
        })
        .collect()
}

/// Title, property text and body text joined for full-text search,
/// skipping empty parts.
pub fn compose_text_blob(title: &str, property_text: &str, plain_text: &str) -> String {
    [title, property_text, plain_text]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn join_runs(runs: &[RichTextRun], separator: &str) -> String {
    runs.iter()
        .map(|run| run.plain_text.as_str())
        .collect::<Vec<_>>()
        .join(separator)
}

fn trimmed(text: Option<&str>) -> String {
    text.unwrap_or_default().trim().to_string()
}

fn bool_text(value: bool) -> String {
    if value { "true" } else { "false" }.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn record(properties: Value) -> RemoteRecord {
        RemoteRecord::from_json(json!({"id": "rec-1", "properties": properties})).unwrap()
    }

    #[test]
    fn title_concatenates_runs_without_separator() {
        let rec = record(json!({
            "Name": {"type": "title", "title": [{"plain_text": " Deep "}, {"plain_text": "Work "}]}
        }));
        assert_eq!(record_title(&rec, "Name"), "Deep Work");
        assert_eq!(record_title(&rec, "Missing"), "");
    }

    #[test]
    fn title_of_non_title_property_is_empty() {
        let rec = record(json!({"Name": {"type": "rich_text", "rich_text": [{"plain_text": "x"}]}}));
        assert_eq!(record_title(&rec, "Name"), "");
    }

    #[test]
    fn property_text_renders_each_kind() {
        let rec = record(json!({
            "Name": {"type": "title", "title": [{"plain_text": "A"}, {"plain_text": "B"}]},
            "Score": {"type": "number", "number": 7},
            "Empty": {"type": "number", "number": null},
            "Stage": {"type": "status", "status": {"name": "Doing"}},
            "Kind": {"type": "select", "select": null},
            "Tags": {"type": "multi_select", "multi_select": [{"name": "x"}, {"name": ""}, {"name": "y"}]},
            "When": {"type": "date", "date": {"start": "2026-01-01", "end": "2026-01-05"}},
            "Once": {"type": "date", "date": {"start": "2026-02-01", "end": null}},
            "Done": {"type": "checkbox", "checkbox": false},
            "Calc": {"type": "formula", "formula": {"type": "boolean", "boolean": true}},
            "Due": {"type": "formula", "formula": {"type": "date", "date": {"start": "2026-03-01"}}},
            "Links": {"type": "relation", "relation": [{"id": "other"}]},
            "Owner": {"type": "people", "people": [{"id": "u"}]},
            "Mail": {"type": "email", "email": " a@b.c "}
        }));

        assert_eq!(
            flatten_property_text(&rec.properties),
            [
                "Name:A B",
                "Score:7",
                "Stage:Doing",
                "Tags:x y",
                "When:2026-01-01 2026-01-05",
                "Once:2026-02-01",
                "Done:false",
                "Calc:true",
                "Due:2026-03-01",
                "Mail:a@b.c",
            ]
            .join("\n")
        );
    }

    #[test]
    fn relation_text_lists_target_ids() {
        let value = PropertyValue::from_json(
            "Links",
            &json!({"type": "relation", "relation": [{"id": "a"}, {"id": "b"}]}),
        );
        assert_eq!(property_text(&value), "a b");
    }

    #[test]
    fn relations_yield_one_edge_per_target() {
        let rec = record(json!({
            "Concepts": {"type": "relation", "relation": [{"id": "c1"}, {"id": "c2"}]},
            "Skills": {"type": "relation", "relation": []},
            "Name": {"type": "title", "title": []}
        }));
        let edges = record_relations(&rec, "errors");
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].from_record_id, "rec-1");
        assert_eq!(edges[0].from_logical_db, "errors");
        assert_eq!(edges[0].property_name, "Concepts");
        assert_eq!(edges[1].to_record_id, "c2");
    }

    #[test]
    fn first_title_property_follows_schema_order() {
        let schema: IndexMap<String, Value> = serde_json::from_value(json!({
            "Notes": {"type": "rich_text"},
            "Headline": {"type": "title"},
            "Other": {"type": "title"}
        }))
        .unwrap();
        assert_eq!(first_title_property(&schema).as_deref(), Some("Headline"));
        assert_eq!(first_title_property(&IndexMap::new()), None);
    }

    #[test]
    fn text_blob_skips_empty_parts() {
        assert_eq!(compose_text_blob("T", "", "body"), "T\nbody");
        assert_eq!(compose_text_blob("", "", ""), "");
    }
}
