// src/api/simple_pagination.rs
//! Cursor pagination over any list endpoint.

use super::types::{PaginatedResponse, PaginationResult};
use crate::error::AppError;

/// Fetches every page by following `next_cursor` until `has_more` is false.
///
/// `fetch_fn` receives the cursor for the page to fetch (`None` for the
/// first one). Items are returned in the order the API produced them.
pub async fn fetch_all_pages<T, F, Fut>(mut fetch_fn: F) -> Result<PaginationResult<T>, AppError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: std::future::Future<Output = Result<PaginatedResponse<T>, AppError>>,
{
    let mut all_items = Vec::new();
    let mut cursor = None;
    let mut pages_fetched = 0u32;

    loop {
        let response = fetch_fn(cursor).await?;

        pages_fetched += 1;
        all_items.extend(response.results);
        cursor = response.next_cursor;

        if !response.has_more || cursor.is_none() {
            break;
        }
    }

    log::debug!(
        "Pagination finished: {} items over {} pages",
        all_items.len(),
        pages_fetched
    );

    Ok(PaginationResult {
        items: all_items,
        pages_fetched,
    })
}
