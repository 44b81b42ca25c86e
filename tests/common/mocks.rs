//! Mock implementations for testing.
//!
//! Scripted chat clients and a canned search backend shared by the research
//! and API tests. Every mock records what it was asked so tests can check
//! prompts, call counts and session lifetimes without a network.

use async_trait::async_trait;
use council::llm::{ChatMessage, ChunkStream, LLMClient, LLMClientFactory};
use council::tools::search::WebSearch;
use council::types::{AppError, Result, SearchResult};
use council::utils::toml_config::ProviderConfig;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// How a scripted model answers one stage.
#[derive(Clone, Debug)]
pub enum Reply {
    Text(String),
    Fail(String),
    /// Never answers; only a timeout or cancellation ends the call
    Hang,
}

impl Reply {
    pub fn text(text: &str) -> Self {
        Reply::Text(text.to_string())
    }

    async fn resolve(&self) -> Result<String> {
        match self {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Fail(message) => Err(AppError::LLM(message.clone())),
            Reply::Hang => std::future::pending().await,
        }
    }
}

/// Behaviour of one model across query generation, summary and streaming.
#[derive(Clone, Debug)]
pub struct ModelScript {
    pub query: Reply,
    pub summary: Reply,
    pub chunks: Vec<String>,
    pub stream_error: Option<String>,
    /// Delay before every completion
    pub delay: Duration,
}

impl ModelScript {
    /// Research model that searches for `query` and summarises with `summary`
    pub fn answering(query: &str, summary: &str) -> Self {
        Self {
            query: Reply::text(query),
            summary: Reply::text(summary),
            chunks: Vec::new(),
            stream_error: None,
            delay: Duration::ZERO,
        }
    }

    /// Model whose every call fails with `message`
    pub fn failing(message: &str) -> Self {
        Self {
            query: Reply::Fail(message.to_string()),
            summary: Reply::Fail(message.to_string()),
            ..Self::answering("", "")
        }
    }

    /// Model that never answers
    pub fn hanging() -> Self {
        Self {
            query: Reply::Hang,
            summary: Reply::Hang,
            ..Self::answering("", "")
        }
    }

    /// Solver streaming `chunks`
    pub fn streaming(chunks: &[&str]) -> Self {
        Self {
            chunks: chunks.iter().map(|c| c.to_string()).collect(),
            ..Self::answering("", "")
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_stream_error(mut self, message: &str) -> Self {
        self.stream_error = Some(message.to_string());
        self
    }
}

/// One request seen by a mock client.
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub streamed: bool,
}

impl RecordedRequest {
    /// Text of the final turn
    pub fn last_content(&self) -> &str {
        self.messages
            .last()
            .map(|m| m.content.as_str())
            .unwrap_or_default()
    }
}

/// Scripted client; counts itself released when dropped.
pub struct MockLLMClient {
    model: String,
    script: ModelScript,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    released: Arc<AtomicUsize>,
}

impl MockLLMClient {
    fn record(&self, messages: &[ChatMessage], streamed: bool) {
        self.requests.lock().push(RecordedRequest {
            model: self.model.clone(),
            messages: messages.to_vec(),
            streamed,
        });
    }
}

impl Drop for MockLLMClient {
    fn drop(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        self.record(messages, false);
        if !self.script.delay.is_zero() {
            tokio::time::sleep(self.script.delay).await;
        }

        let is_summary = messages
            .last()
            .is_some_and(|m| m.content.contains("[Search result context]"));
        if is_summary {
            self.script.summary.resolve().await
        } else {
            self.script.query.resolve().await
        }
    }

    async fn complete_stream(&self, messages: &[ChatMessage]) -> Result<ChunkStream> {
        self.record(messages, true);

        let mut items: Vec<Result<String>> =
            self.script.chunks.iter().cloned().map(Ok).collect();
        if let Some(message) = &self.script.stream_error {
            items.push(Err(AppError::LLM(message.clone())));
        }
        Ok(Box::pin(futures::stream::iter(items)))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Factory handing out [`MockLLMClient`]s scripted per model name.
#[derive(Default)]
pub struct MockLLMFactory {
    scripts: HashMap<String, ModelScript>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    created: AtomicUsize,
    released: Arc<AtomicUsize>,
}

impl MockLLMFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model: &str, script: ModelScript) -> Self {
        self.scripts.insert(model.to_string(), script);
        self
    }

    /// Every request, in the order the clients received them
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    pub fn requests_for(&self, model: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.model == model)
            .collect()
    }

    pub fn sessions_opened(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn sessions_released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LLMClientFactory for MockLLMFactory {
    async fn create(&self, provider: &ProviderConfig) -> Result<Box<dyn LLMClient>> {
        let script = self.scripts.get(&provider.model).cloned().ok_or_else(|| {
            AppError::Configuration(format!("No script for model '{}'", provider.model))
        })?;

        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockLLMClient {
            model: provider.model.clone(),
            script,
            requests: Arc::clone(&self.requests),
            released: Arc::clone(&self.released),
        }))
    }
}

/// Search backend returning canned hits per query.
#[derive(Default)]
pub struct MockSearch {
    results: HashMap<String, Vec<SearchResult>>,
    queries: Mutex<Vec<String>>,
}

impl MockSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_results(mut self, query: &str, results: Vec<SearchResult>) -> Self {
        self.results.insert(query.to_string(), results);
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl WebSearch for MockSearch {
    async fn search(&self, query: &str, max_results: usize) -> Vec<SearchResult> {
        self.queries.lock().push(query.to_string());
        self.results
            .get(query)
            .map(|hits| hits.iter().take(max_results).cloned().collect())
            .unwrap_or_default()
    }

    fn name(&self) -> &str {
        "mock"
    }
}

pub fn hit(title: &str, url: &str) -> SearchResult {
    SearchResult {
        title: title.to_string(),
        content: format!("About {}", title),
        url: url.to_string(),
    }
}

pub fn provider(model: &str) -> ProviderConfig {
    ProviderConfig::new(model, "http://localhost:1", "sk-test")
}
