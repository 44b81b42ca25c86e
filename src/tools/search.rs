//! Web search capability
//!
//! Every backend implements [`WebSearch`], which never fails: transport or
//! decoding problems are logged and reported as an empty result list, the
//! same answer as "nothing found".

use crate::types::{AppError, Result, SearchResult};
use crate::utils::toml_config::{SearchBackend, SearchConfig};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Search capability used by the research pipeline.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WebSearch: Send + Sync {
    /// Return at most `max_results` hits, in backend ranking order
    async fn search(&self, query: &str, max_results: usize) -> Vec<SearchResult>;

    /// Short backend name for logs and health output
    fn name(&self) -> &str;
}

// ============= Tavily =============

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyHit>,
}

#[derive(Debug, Deserialize)]
struct TavilyHit {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

/// Tavily search API client
pub struct TavilySearch {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl TavilySearch {
    pub fn new(api_key: String, base_url: String, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn try_search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        let body = json!({
            "api_key": self.api_key,
            "query": query,
            "max_results": max_results,
            "search_depth": "basic",
            "include_answer": false,
            "include_raw_content": false
        });

        let response = self
            .http
            .post(format!("{}/search", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Search(format!("Tavily request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Search(format!(
                "Tavily returned status {}: {}",
                status, text
            )));
        }

        let payload: TavilyResponse = response
            .json()
            .await
            .map_err(|e| AppError::Search(format!("Invalid Tavily response: {}", e)))?;

        Ok(payload
            .results
            .into_iter()
            .take(max_results)
            .map(|hit| SearchResult {
                title: hit.title.unwrap_or_else(|| "Untitled".to_string()),
                content: hit.content.unwrap_or_default(),
                url: hit.url.unwrap_or_default(),
            })
            .collect())
    }
}

#[async_trait]
impl WebSearch for TavilySearch {
    async fn search(&self, query: &str, max_results: usize) -> Vec<SearchResult> {
        match self.try_search(query, max_results).await {
            Ok(results) => {
                debug!(query, count = results.len(), "Tavily search completed");
                results
            }
            Err(e) => {
                warn!("Search error: {}", e);
                Vec::new()
            }
        }
    }

    fn name(&self) -> &str {
        "tavily"
    }
}

// ============= DuckDuckGo =============

/// Keyless web search powered by daedra (DuckDuckGo backend)
pub struct DuckDuckGoSearch {
    timeout: Duration,
}

impl DuckDuckGoSearch {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn try_search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        let search_args = daedra::SearchArgs {
            query: query.to_string(),
            options: Some(daedra::SearchOptions {
                num_results: max_results,
                ..Default::default()
            }),
        };

        let response = tokio::time::timeout(
            self.timeout,
            daedra::tools::search::perform_search(&search_args),
        )
        .await
        .map_err(|_| AppError::Timeout(self.timeout.as_secs(), "duckduckgo search".to_string()))?
        .map_err(|e| AppError::Search(format!("Search failed: {}", e)))?;

        Ok(response
            .data
            .iter()
            .take(max_results)
            .map(|r| SearchResult {
                title: r.title.clone(),
                content: r.description.clone(),
                url: r.url.clone(),
            })
            .collect())
    }
}

#[async_trait]
impl WebSearch for DuckDuckGoSearch {
    async fn search(&self, query: &str, max_results: usize) -> Vec<SearchResult> {
        match self.try_search(query, max_results).await {
            Ok(results) => results,
            Err(e) => {
                warn!("Search error: {}", e);
                Vec::new()
            }
        }
    }

    fn name(&self) -> &str {
        "duckduckgo"
    }
}

// ============= Disabled =============

/// Search backend used when no search provider is configured
pub struct DisabledSearch;

#[async_trait]
impl WebSearch for DisabledSearch {
    async fn search(&self, _query: &str, _max_results: usize) -> Vec<SearchResult> {
        Vec::new()
    }

    fn name(&self) -> &str {
        "disabled"
    }
}

/// Build the configured search backend.
///
/// Tavily without a resolvable key degrades to [`DisabledSearch`].
pub fn search_from_config(config: &SearchConfig) -> Result<Arc<dyn WebSearch>> {
    match config.backend {
        SearchBackend::Tavily => match std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
        {
            Some(api_key) => Ok(Arc::new(TavilySearch::new(
                api_key,
                config.base_url.clone(),
                config.timeout(),
            )?)),
            None => {
                warn!(
                    "{} is not set; web search is disabled and every provider will report no results",
                    config.api_key_env
                );
                Ok(Arc::new(DisabledSearch))
            }
        },
        SearchBackend::DuckDuckGo => Ok(Arc::new(DuckDuckGoSearch::new(config.timeout()))),
        SearchBackend::Disabled => Ok(Arc::new(DisabledSearch)),
    }
}
