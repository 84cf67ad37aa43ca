use serde::{Deserialize, Serialize};
use serde_json::Number;

/// One run of rich text. Only the rendered `plain_text` is mirrored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RichTextRun {
    #[serde(default)]
    pub plain_text: String,
}

/// A select, status or multi-select option.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
}

/// A link from a relation property to another record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationRef {
    #[serde(default)]
    pub id: String,
}

/// The computed value of a formula property, tagged by its result type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FormulaValue {
    String {
        #[serde(default)]
        string: Option<String>,
    },
    Number {
        #[serde(default)]
        number: Option<Number>,
    },
    Boolean {
        #[serde(default)]
        boolean: Option<bool>,
    },
    Date {
        #[serde(default)]
        date: Option<DateRange>,
    },
    #[serde(other)]
    Other,
}

/// A record property value, tagged by the `type` field of the API payload.
///
/// Kinds the mirror does not render (people, files, rollups, ...) land in
/// `Unsupported` and contribute nothing to the property text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertyValue {
    Title {
        #[serde(default)]
        title: Vec<RichTextRun>,
    },
    RichText {
        #[serde(default)]
        rich_text: Vec<RichTextRun>,
    },
    Number {
        #[serde(default)]
        number: Option<Number>,
    },
    Url {
        #[serde(default)]
        url: Option<String>,
    },
    Email {
        #[serde(default)]
        email: Option<String>,
    },
    PhoneNumber {
        #[serde(default)]
        phone_number: Option<String>,
    },
    Select {
        #[serde(default)]
        select: Option<SelectOption>,
    },
    Status {
        #[serde(default)]
        status: Option<SelectOption>,
    },
    MultiSelect {
        #[serde(default)]
        multi_select: Vec<SelectOption>,
    },
    Date {
        #[serde(default)]
        date: Option<DateRange>,
    },
    Checkbox {
        #[serde(default)]
        checkbox: bool,
    },
    Formula {
        #[serde(default)]
        formula: Option<FormulaValue>,
    },
    Relation {
        #[serde(default)]
        relation: Vec<RelationRef>,
    },
    #[serde(other)]
    Unsupported,
}

impl PropertyValue {
    /// Parses one raw property payload, degrading to `Unsupported` when the
    /// payload does not match the shape its `type` promises.
    pub fn from_json(name: &str, raw: &serde_json::Value) -> Self {
        match serde_json::from_value(raw.clone()) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Unreadable property '{}': {}", name, e);
                PropertyValue::Unsupported
            }
        }
    }

    /// Returns the Notion API type name for this property value.
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::Title { .. } => "title",
            PropertyValue::RichText { .. } => "rich_text",
            PropertyValue::Number { .. } => "number",
            PropertyValue::Url { .. } => "url",
            PropertyValue::Email { .. } => "email",
            PropertyValue::PhoneNumber { .. } => "phone_number",
            PropertyValue::Select { .. } => "select",
            PropertyValue::Status { .. } => "status",
            PropertyValue::MultiSelect { .. } => "multi_select",
            PropertyValue::Date { .. } => "date",
            PropertyValue::Checkbox { .. } => "checkbox",
            PropertyValue::Formula { .. } => "formula",
            PropertyValue::Relation { .. } => "relation",
            PropertyValue::Unsupported => "unsupported",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn property_kinds_are_read_from_the_type_tag() {
        let value = PropertyValue::from_json(
            "Tags",
            &json!({"id": "x", "type": "multi_select", "multi_select": [{"name": "a"}]}),
        );
        assert_eq!(
            value,
            PropertyValue::MultiSelect {
                multi_select: vec![SelectOption {
                    name: Some("a".into())
                }]
            }
        );
    }

    #[test]
    fn unknown_kinds_become_unsupported() {
        let value = PropertyValue::from_json("Owner", &json!({"type": "people", "people": []}));
        assert_eq!(value, PropertyValue::Unsupported);
    }

    #[test]
    fn mismatched_payloads_degrade_instead_of_failing() {
        let value = PropertyValue::from_json("Done", &json!({"type": "checkbox", "checkbox": "yes"}));
        assert_eq!(value, PropertyValue::Unsupported);
    }

    #[test]
    fn formula_results_keep_their_kind() {
        let value = PropertyValue::from_json(
            "Score",
            &json!({"type": "formula", "formula": {"type": "number", "number": 4.5}}),
        );
        match value {
            PropertyValue::Formula {
                formula: Some(FormulaValue::Number { number: Some(n) }),
            } => assert_eq!(n.to_string(), "4.5"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
