// src/api/client.rs
//! HTTP transport for the Notion API.
//!
//! A thin wrapper around reqwest: authentication headers, endpoint URLs and
//! response capture. Retry, pagination and interpretation of the payloads
//! live in the gateway.

use super::parser::parse_api_response;
use super::types::{PaginatedResponse, QueryTarget};
use super::NotionTransport;
use crate::error::AppError;
use crate::types::ApiKey;
use reqwest::{header, Client, Response};
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;

/// API version that exposes data sources next to databases.
const NOTION_VERSION: &str = "2025-09-03";
const API_BASE_URL: &str = "https://api.notion.com/v1";

/// A thin wrapper around reqwest Client for Notion API requests.
#[derive(Clone)]
pub struct NotionHttpClient {
    client: Client,
    base_url: String,
}

impl NotionHttpClient {
    /// Creates a new HTTP client with Notion API authentication.
    pub fn new(api_key: &ApiKey, request_timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .default_headers(Self::create_headers(api_key)?)
            .timeout(request_timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: API_BASE_URL.to_string(),
        })
    }

    /// Points the client at another API root, e.g. a recording proxy.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Creates the default headers for Notion API requests.
    fn create_headers(api_key: &ApiKey) -> Result<header::HeaderMap, AppError> {
        let mut headers = header::HeaderMap::new();

        let auth_header = format!("Bearer {}", api_key.as_str());
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&auth_header).map_err(|e| {
                AppError::MissingConfiguration(format!("Invalid API token format: {}", e))
            })?,
        );

        headers.insert(
            "Notion-Version",
            header::HeaderValue::from_static(NOTION_VERSION),
        );

        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        Ok(headers)
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    /// Makes a GET request to the specified endpoint.
    pub async fn get(&self, endpoint: &str, query: &[(&str, String)]) -> Result<Response, AppError> {
        let url = self.url(endpoint);
        log::debug!("GET {}", url);
        Ok(self.client.get(url).query(query).send().await?)
    }

    /// Makes a POST request with JSON body to the specified endpoint.
    pub async fn post<T: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &T,
    ) -> Result<Response, AppError> {
        let url = self.url(endpoint);
        log::debug!("POST {}", url);
        Ok(self.client.post(url).json(body).send().await?)
    }

    /// Makes a PATCH request with JSON body to the specified endpoint.
    pub async fn patch<T: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &T,
    ) -> Result<Response, AppError> {
        let url = self.url(endpoint);
        log::debug!("PATCH {}", url);
        Ok(self.client.patch(url).json(body).send().await?)
    }

    /// Makes a DELETE request to the specified endpoint.
    pub async fn delete(&self, endpoint: &str) -> Result<Response, AppError> {
        let url = self.url(endpoint);
        log::debug!("DELETE {}", url);
        Ok(self.client.delete(url).send().await?)
    }
}

#[async_trait::async_trait]
impl NotionTransport for NotionHttpClient {
    async fn retrieve_database(&self, database_id: &str) -> Result<Value, AppError> {
        let response = self.get(&format!("databases/{}", database_id), &[]).await?;
        parse_api_response(extract_response_text(response).await?)
    }

    async fn retrieve_data_source(&self, data_source_id: &str) -> Result<Value, AppError> {
        let response = self
            .get(&format!("data_sources/{}", data_source_id), &[])
            .await?;
        parse_api_response(extract_response_text(response).await?)
    }

    async fn query_records(
        &self,
        target: &QueryTarget,
        body: &Value,
    ) -> Result<PaginatedResponse<Value>, AppError> {
        let response = self.post(&target.endpoint(), body).await?;
        parse_api_response(extract_response_text(response).await?)
    }

    async fn list_block_children(
        &self,
        block_id: &str,
        start_cursor: Option<&str>,
        page_size: u32,
    ) -> Result<PaginatedResponse<Value>, AppError> {
        let mut query = vec![("page_size", page_size.to_string())];
        if let Some(cursor) = start_cursor {
            query.push(("start_cursor", cursor.to_string()));
        }
        let response = self
            .get(&format!("blocks/{}/children", block_id), &query)
            .await?;
        parse_api_response(extract_response_text(response).await?)
    }

    async fn update_page(&self, page_id: &str, body: &Value) -> Result<Value, AppError> {
        let response = self.patch(&format!("pages/{}", page_id), body).await?;
        parse_api_response(extract_response_text(response).await?)
    }

    async fn delete_block(&self, block_id: &str) -> Result<Value, AppError> {
        let response = self.delete(&format!("blocks/{}", block_id)).await?;
        parse_api_response(extract_response_text(response).await?)
    }

    async fn append_block_children(
        &self,
        block_id: &str,
        children: &[Value],
    ) -> Result<Value, AppError> {
        let body = json!({ "children": children });
        let response = self
            .patch(&format!("blocks/{}/children", block_id), &body)
            .await?;
        parse_api_response(extract_response_text(response).await?)
    }
}

/// Result of an HTTP operation with response metadata.
#[derive(Debug)]
pub struct ApiResponse<T> {
    pub data: T,
    pub status: u16,
    pub url: String,
}

/// Extracts the response body as text with metadata.
pub async fn extract_response_text(response: Response) -> Result<ApiResponse<String>, AppError> {
    let status = response.status().as_u16();
    let url = response.url().to_string();
    let text = response.text().await?;

    Ok(ApiResponse {
        data: text,
        status,
        url,
    })
}
