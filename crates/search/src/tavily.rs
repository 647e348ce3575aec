//! Tavily search API client.
//!
//! API: https://docs.tavily.com/documentation/api-reference/endpoint/search

use crate::client::{WebResult, WebSearch};
use architect_core::{AppError, AppResult};
use serde::Serialize;
use serde_json::Value;

/// Default Tavily endpoint.
pub const TAVILY_ENDPOINT: &str = "https://api.tavily.com/search";

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    search_depth: &'a str,
    max_results: usize,
}

/// Tavily web search client.
pub struct TavilyClient {
    api_key: String,
    endpoint: String,
    search_depth: String,
    client: reqwest::Client,
}

impl TavilyClient {
    /// Create a client with the default endpoint and "basic" depth.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: TAVILY_ENDPOINT.to_string(),
            search_depth: "basic".to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Use a different endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the search depth ("basic" or "advanced").
    pub fn with_search_depth(mut self, depth: impl Into<String>) -> Self {
        self.search_depth = depth.into();
        self
    }

    fn to_request<'a>(&'a self, query: &'a str, max_results: usize) -> TavilyRequest<'a> {
        TavilyRequest {
            api_key: &self.api_key,
            query,
            search_depth: &self.search_depth,
            max_results,
        }
    }
}

/// Extract results from a Tavily response body; malformed entries are skipped.
fn parse_results(data: &Value) -> Vec<WebResult> {
    data["results"]
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|r| {
                    Some(WebResult {
                        title: r["title"].as_str()?.to_string(),
                        content: r["content"].as_str().unwrap_or("").to_string(),
                        url: r["url"].as_str().map(str::to_string),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait::async_trait]
impl WebSearch for TavilyClient {
    fn provider_name(&self) -> &str {
        "tavily"
    }

    async fn search(&self, query: &str, max_results: usize) -> AppResult<Vec<WebResult>> {
        tracing::info!(query = query, max_results, "Searching the web via Tavily");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&self.to_request(query, max_results))
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() || e.is_request() {
                    AppError::Network(format!("Tavily unreachable: {}", e))
                } else {
                    AppError::WebSearch(format!("Tavily search failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = format!("Tavily search error: {}", status);
            return Err(
                if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                    AppError::Network(message)
                } else {
                    AppError::WebSearch(message)
                },
            );
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| AppError::WebSearch(format!("Failed to parse Tavily response: {}", e)))?;

        let mut results = parse_results(&data);
        results.truncate(max_results);

        tracing::debug!("Tavily returned {} results", results.len());
        Ok(results)
    }
}
