//! Remote read/write protocol of the gateway: retry and backoff, cursor
//! pagination, data-source resolution and content replacement.

mod common;

use common::{
    data_source, database_with_data_source, legacy_database, paragraph, record, service_error,
    FakeTransport,
};
use notion_sync::api::QueryTarget;
use notion_sync::{
    AppError, BlockRenderer, NotionErrorCode, NotionGateway, NotionId, RemoteGateway,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::time::Duration;

const DB: &str = "eb1861e3-dd9f-4d05-8f66-eed20405c5bb";
const DS: &str = "ds-resources";

fn db_id() -> NotionId {
    NotionId::parse(DB).unwrap()
}

fn three_pages_of_records() -> Vec<Value> {
    (0..7)
        .map(|i| {
            record(
                &format!("r{i}"),
                &format!("Record {i}"),
                "2026-01-01T00:00:00.000Z",
                &[],
            )
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn four_transient_failures_then_success() {
    let transport = FakeTransport::new().with_database(DB, legacy_database(DB));
    transport.fail_transiently("databases.retrieve", 4);
    let gateway = NotionGateway::new(transport);

    let database = gateway.get_database(DB).await.unwrap();
    assert_eq!(database["id"], DB);
    assert_eq!(gateway.transport().calls("databases.retrieve"), 5);
}

#[tokio::test(start_paused = true)]
async fn five_transient_failures_give_up_after_exponential_backoff() {
    let transport = FakeTransport::new().with_database(DB, legacy_database(DB));
    transport.fail_transiently("databases.retrieve", 5);
    let gateway = NotionGateway::new(transport);

    let started = tokio::time::Instant::now();
    let err = gateway.get_database(DB).await.unwrap_err();
    let elapsed = started.elapsed();

    assert_eq!(err.notion_code(), Some(&NotionErrorCode::RateLimited));
    assert_eq!(gateway.transport().calls("databases.retrieve"), 5);
    // 0.5 + 1 + 2 + 4 seconds
    assert!(elapsed >= Duration::from_millis(7500), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(7600), "{elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn permanent_errors_are_not_retried() {
    let gateway = NotionGateway::new(FakeTransport::new());
    let err = gateway.get_database(DB).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::NotionService {
            code: NotionErrorCode::ObjectNotFound,
            status: 404,
            ..
        }
    ));
    assert_eq!(gateway.transport().calls("databases.retrieve"), 1);
}

#[tokio::test]
async fn query_follows_cursors_to_exhaustion() {
    let transport = FakeTransport::new()
        .with_database(DB, database_with_data_source(DB, DS))
        .with_data_source(DS, data_source(DS))
        .with_records(three_pages_of_records());
    let gateway = NotionGateway::new(transport);

    let records = gateway.query_all_records(&db_id(), 3, None).await.unwrap();

    let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["r0", "r1", "r2", "r3", "r4", "r5", "r6"]);

    let queries = gateway.transport().queries();
    assert_eq!(queries.len(), 3);
    assert_eq!(queries[0].0, QueryTarget::DataSource(DS.to_string()));
    assert_eq!(queries[0].1, json!({"page_size": 3}));
    assert_eq!(queries[1].1["start_cursor"], "3");
    assert_eq!(queries[2].1["start_cursor"], "6");
}

#[tokio::test]
async fn watermark_becomes_inclusive_filter() {
    let transport = FakeTransport::new()
        .with_database(DB, database_with_data_source(DB, DS))
        .with_records(vec![
            record("old", "Old", "2025-12-31T23:59:59.000Z", &[]),
            record("same", "Same", "2026-01-01T00:00:00Z", &[]),
            record("new", "New", "2026-01-02T00:00:00Z", &[]),
        ]);
    let gateway = NotionGateway::new(transport);

    let records = gateway
        .query_all_records(&db_id(), 100, Some("2026-01-01T00:00:00Z"))
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    let queries = gateway.transport().queries();
    let (_, body) = &queries[0];
    assert_eq!(
        body["filter"],
        json!({
            "timestamp": "last_edited_time",
            "last_edited_time": {"on_or_after": "2026-01-01T00:00:00Z"}
        })
    );
}

#[tokio::test]
async fn databases_without_data_source_use_legacy_query() {
    let transport = FakeTransport::new()
        .with_database(DB, legacy_database(DB))
        .with_records(three_pages_of_records());
    let gateway = NotionGateway::new(transport);

    let schema = gateway.fetch_schema(&db_id()).await.unwrap();
    assert_eq!(schema.source().as_str(), "database");
    assert_eq!(schema.title_property("resources").unwrap(), "Name");

    gateway.query_all_records(&db_id(), 100, None).await.unwrap();
    let queries = gateway.transport().queries();
    let (target, _) = &queries[0];
    assert_eq!(target, &QueryTarget::Database(DB.to_string()));
    assert_eq!(target.endpoint(), format!("databases/{DB}/query"));
}

#[tokio::test]
async fn schema_falls_back_to_data_source_and_is_cached() {
    let transport = FakeTransport::new()
        .with_database(DB, database_with_data_source(DB, DS))
        .with_data_source(DS, data_source(DS));
    let gateway = NotionGateway::new(transport);

    let schema = gateway.fetch_schema(&db_id()).await.unwrap();
    assert_eq!(schema.data_source_id(), Some(DS));
    assert_eq!(schema.title_property("resources").unwrap(), "Name");

    let merged = schema.merged_json();
    assert_eq!(merged["_schema_source"], "data_source");
    assert_eq!(merged["_data_source_id"], DS);
    assert!(merged["properties"]["Related"].is_object());

    // The data source id is already known: no second database lookup.
    gateway.query_all_records(&db_id(), 100, None).await.unwrap();
    assert_eq!(gateway.transport().calls("databases.retrieve"), 1);
}

#[tokio::test]
async fn missing_title_property_is_a_schema_error() {
    let transport = FakeTransport::new().with_database(
        DB,
        json!({"id": DB, "properties": {"Notes": {"type": "rich_text"}}}),
    );
    let gateway = NotionGateway::new(transport);

    let schema = gateway.fetch_schema(&db_id()).await.unwrap();
    let err = schema.title_property("resources").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Schema error for database 'resources': No title property found in database schema"
    );
}

#[tokio::test]
async fn plain_text_respects_depth_and_length() {
    let transport = FakeTransport::new()
        .with_children(
            "page",
            vec![
                paragraph("d0", "Depth zero paragraph", true),
                paragraph("d0b", "Sibling paragraph text", false),
            ],
        )
        .with_children("d0", vec![paragraph("d1", "Depth one", true)])
        .with_children("d1", vec![paragraph("d2", "Depth two", true)])
        .with_children("d2", vec![paragraph("d3", "Depth three", true)])
        .with_children("d3", vec![paragraph("d4", "Depth four", false)]);
    let gateway = NotionGateway::new(transport);

    let text = gateway.fetch_record_plain_text("page", 50, 2).await.unwrap();

    assert_eq!(text.chars().count(), 50);
    assert_eq!(
        text,
        "Depth zero paragraph\nDepth one\nDepth two\nSibling paragraph text"
            .chars()
            .take(50)
            .collect::<String>()
    );
    assert!(!gateway
        .transport()
        .listed_blocks()
        .contains(&"d2".to_string()));
}

#[tokio::test]
async fn short_content_is_returned_whole() {
    let transport = FakeTransport::new().with_children(
        "page",
        vec![paragraph("a", "Alpha", false), paragraph("b", "Beta", false)],
    );
    let gateway = NotionGateway::new(transport);

    let text = gateway.fetch_record_plain_text("page", 1600, 2).await.unwrap();
    assert_eq!(text, "Alpha\nBeta");
}

#[tokio::test]
async fn replace_content_deletes_then_appends_in_chunks() {
    let existing: Vec<Value> = (0..3)
        .map(|i| paragraph(&format!("old{i}"), "old", false))
        .collect();
    let transport = FakeTransport::new().with_children("page", existing);
    let gateway = NotionGateway::new(transport);

    let blocks: Vec<Value> = (0..120)
        .map(|i| paragraph(&format!("new{i}"), "new", false))
        .collect();
    let replaced = gateway.replace_record_content("page", &blocks).await.unwrap();

    assert_eq!(replaced.deleted, 3);
    assert_eq!(replaced.appended, 120);
    assert_eq!(gateway.transport().deleted_blocks(), vec!["old0", "old1", "old2"]);
    let chunk_sizes: Vec<_> = gateway
        .transport()
        .appended_chunks()
        .into_iter()
        .map(|(_, n)| n)
        .collect();
    assert_eq!(chunk_sizes, vec![50, 50, 20]);
}

#[tokio::test]
async fn property_update_wraps_properties() {
    let gateway = NotionGateway::new(FakeTransport::new());
    gateway
        .update_record_properties("page", &json!({"Status": {"select": {"name": "Done"}}}))
        .await
        .unwrap();

    let updates = gateway.transport().updates();
    assert_eq!(updates[0].0, "page");
    assert_eq!(updates[0].1["properties"]["Status"]["select"]["name"], "Done");
}

struct LineRenderer;

impl BlockRenderer for LineRenderer {
    fn render(&self, markdown: &str) -> Result<Vec<Value>, AppError> {
        Ok(markdown
            .lines()
            .filter(|line| !line.trim().is_empty())
            .enumerate()
            .map(|(i, line)| paragraph(&format!("line{i}"), line, false))
            .collect())
    }
}

#[tokio::test]
async fn markdown_goes_through_the_renderer() {
    let gateway = NotionGateway::new(FakeTransport::new());
    let replaced = gateway
        .replace_record_markdown("page", "# Title\n\nBody\n", &LineRenderer)
        .await
        .unwrap();
    assert_eq!(replaced.deleted, 0);
    assert_eq!(replaced.appended, 2);
}

#[tokio::test(start_paused = true)]
async fn transient_append_failures_are_retried() {
    let transport = FakeTransport::new();
    transport.fail_transiently("blocks.children.append", 2);
    let gateway = NotionGateway::new(transport);

    let blocks = vec![paragraph("x", "x", false)];
    let replaced = gateway.replace_record_content("page", &blocks).await.unwrap();
    assert_eq!(replaced.appended, 1);
    assert_eq!(gateway.transport().calls("blocks.children.append"), 3);
}

#[test]
fn service_error_helper_is_retryable_only_for_transient_codes() {
    assert!(service_error(NotionErrorCode::RateLimited, 429).is_retryable());
    assert!(!service_error(NotionErrorCode::Unauthorized, 401).is_retryable());
}
