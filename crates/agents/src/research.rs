use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;

use estately_core::config::WebSearchConfig;

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct SearchHit {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Error)]
pub enum ResearchError {
    #[error("web search is not configured: {0}")]
    NotConfigured(String),
    #[error("web search transport failure: {0}")]
    Network(String),
    #[error("web search API returned status {0}")]
    Api(u16),
    #[error("web search response was malformed: {0}")]
    InvalidResponse(String),
}

/// Live market lookup. Any error means "no live data"; the caller renders
/// a canned fallback instead of failing the turn.
#[async_trait]
pub trait WebSearcher: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, ResearchError>;
}

/// Tavily-style search API client: a single POST carrying the key in the
/// request body.
pub struct TavilySearcher {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    max_results: u32,
}

impl TavilySearcher {
    pub fn new(config: &WebSearchConfig) -> Result<Self, ResearchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| ResearchError::Network(error.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.as_ref().map(|key| key.expose_secret().to_string()),
            max_results: config.max_results,
        })
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[async_trait]
impl WebSearcher for TavilySearcher {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, ResearchError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ResearchError::NotConfigured("web_search.api_key is not set".into()))?;

        let body = serde_json::json!({
            "api_key": api_key,
            "query": query,
            "search_depth": "basic",
            "max_results": self.max_results,
        });

        let response = self
            .client
            .post(&self.base_url)
            .json(&body)
            .send()
            .await
            .map_err(|error| ResearchError::Network(error.to_string()))?;

        if !response.status().is_success() {
            return Err(ResearchError::Api(response.status().as_u16()));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|error| ResearchError::InvalidResponse(error.to_string()))?;

        Ok(parsed.results)
    }
}
