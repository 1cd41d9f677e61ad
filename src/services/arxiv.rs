// src/services/arxiv.rs

//! Search API client.
//!
//! Issues paginated queries against the configured endpoint and hands back
//! raw entries as plain JSON values. Decoding into `serde_json::Value` at
//! this boundary keeps transport types out of the rest of the pipeline.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::error::Result;
use crate::models::ApiConfig;

/// Which timestamp the result set is ordered by (most recent first).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Submitted,
    Updated,
}

impl SortOrder {
    /// Query-parameter value understood by the API.
    pub fn as_query_value(&self) -> &'static str {
        match self {
            SortOrder::Submitted => "submittedDate",
            SortOrder::Updated => "lastUpdatedDate",
        }
    }
}

/// One paginated query.
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub query: String,
    pub sort: SortOrder,
    pub start: usize,
    pub max_results: usize,
}

/// A paginated source of raw entries.
///
/// An empty page is a valid terminal signal, not an error.
#[async_trait]
pub trait SearchSource: Send + Sync {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Vec<Value>>;
}

/// Response envelope returned by the search endpoint.
#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    entries: Vec<Value>,
}

/// HTTP client for the search API.
pub struct ArxivClient {
    client: reqwest::Client,
    base_url: String,
}

impl ArxivClient {
    /// Create a client from the API configuration.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    /// Build the query URL for a page request.
    ///
    /// The search query is appended verbatim: it is already written in the
    /// API's own syntax (`cat:hep-ex+OR+hep-ph`), and re-encoding it would
    /// change its meaning.
    fn request_url(&self, request: &PageRequest) -> String {
        format!(
            "{}?search_query={}&sortBy={}&start={}&max_results={}",
            self.base_url,
            request.query,
            request.sort.as_query_value(),
            request.start,
            request.max_results
        )
    }
}

#[async_trait]
impl SearchSource for ArxivClient {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Vec<Value>> {
        let url = Url::parse(&self.request_url(request))?;

        let response = self.client.get(url).send().await?.error_for_status()?;
        let body: QueryResponse = response.json().await?;
        Ok(body.entries)
    }
}
