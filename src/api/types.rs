// src/api/types.rs
//! Request and response shapes shared by the transport and the gateway.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Generic paginated response from Notion API.
#[derive(Debug, Clone, Deserialize)]
pub struct PaginatedResponse<T> {
    #[serde(default)]
    pub object: String,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    #[serde(default)]
    pub next_cursor: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}

impl<T> PaginatedResponse<T> {
    /// A single, final page of results.
    pub fn last(results: Vec<T>) -> Self {
        Self {
            object: "list".to_string(),
            results,
            next_cursor: None,
            has_more: false,
        }
    }

    /// A page followed by more results at `cursor`.
    pub fn with_more(results: Vec<T>, cursor: impl Into<String>) -> Self {
        Self {
            object: "list".to_string(),
            results,
            next_cursor: Some(cursor.into()),
            has_more: true,
        }
    }
}

/// Result of a pagination operation.
#[derive(Debug, Clone)]
pub struct PaginationResult<T> {
    pub items: Vec<T>,
    pub pages_fetched: u32,
}

/// The endpoint family a record query goes through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryTarget {
    /// `data_sources/{id}/query`
    DataSource(String),
    /// Legacy `databases/{id}/query`, for databases without a data source.
    Database(String),
}

impl QueryTarget {
    pub fn endpoint(&self) -> String {
        match self {
            QueryTarget::DataSource(id) => format!("data_sources/{}/query", id),
            QueryTarget::Database(id) => format!("databases/{}/query", id),
        }
    }
}

/// Body of one record-query page request.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordQuery {
    pub page_size: u32,
    pub start_cursor: Option<String>,
    pub filter: Option<Value>,
}

impl RecordQuery {
    pub fn to_body(&self) -> Value {
        let mut body = json!({ "page_size": self.page_size });
        if let Some(cursor) = &self.start_cursor {
            body["start_cursor"] = json!(cursor);
        }
        if let Some(filter) = &self.filter {
            body["filter"] = filter.clone();
        }
        body
    }
}

/// Server-side filter keeping records edited at or after `edited_after`.
///
/// A missing or blank watermark means no filter at all.
pub fn last_edited_filter(edited_after: Option<&str>) -> Option<Value> {
    let ts = edited_after.map(str::trim).filter(|ts| !ts.is_empty())?;
    Some(json!({
        "timestamp": "last_edited_time",
        "last_edited_time": { "on_or_after": ts },
    }))
}

/// Counts reported by a content replacement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ContentReplacement {
    pub deleted: usize,
    pub appended: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_is_inclusive_on_last_edited_time() {
        assert_eq!(
            last_edited_filter(Some(" 2026-01-01T00:00:00Z ")),
            Some(json!({
                "timestamp": "last_edited_time",
                "last_edited_time": {"on_or_after": "2026-01-01T00:00:00Z"}
            }))
        );
    }

    #[test]
    fn blank_watermark_means_no_filter() {
        assert_eq!(last_edited_filter(None), None);
        assert_eq!(last_edited_filter(Some("  ")), None);
    }

    #[test]
    fn query_body_carries_cursor_and_filter_only_when_present() {
        let first = RecordQuery {
            page_size: 25,
            start_cursor: None,
            filter: None,
        };
        assert_eq!(first.to_body(), json!({"page_size": 25}));

        let next = RecordQuery {
            page_size: 25,
            start_cursor: Some("c2".into()),
            filter: last_edited_filter(Some("2026-01-01T00:00:00Z")),
        };
        let body = next.to_body();
        assert_eq!(body["start_cursor"], "c2");
        assert_eq!(body["filter"]["timestamp"], "last_edited_time");
    }
}
