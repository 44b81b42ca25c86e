//! Single-provider research pipeline
//!
//! One run takes a provider through query generation, web search and
//! summarisation. A run never returns an error: every failure is captured as
//! a [`ProviderOutcome::Failed`] so sibling providers are unaffected.

use crate::llm::{LLMClient, LLMClientFactory};
use crate::research::prompts;
use crate::tools::search::WebSearch;
use crate::types::{AppError, ProviderReport, Result};
use crate::utils::toml_config::{CouncilConfig, ProviderConfig};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Summary used when the search stage finds nothing
pub const NO_RESULTS_SUMMARY: &str = "no results found";

/// `search_query` value of a failed run
pub const ERROR_SEARCH_QUERY: &str = "Error";

/// Limits applied to every pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Hits requested from the search backend
    pub max_results: usize,
    /// Hits used as summary context
    pub context_results: usize,
    /// Deadline for each model call and the search call
    pub request_timeout: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_results: 5,
            context_results: 3,
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl PipelineSettings {
    pub fn from_config(config: &CouncilConfig) -> Self {
        Self {
            max_results: config.search.max_results,
            context_results: config.pipeline.context_results,
            request_timeout: config.pipeline.request_timeout(),
        }
    }
}

/// Result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderOutcome {
    /// All stages ran (including the empty-search short circuit)
    Completed(ProviderReport),
    /// A stage failed; the error is kept for the degraded report
    Failed { model: String, error: String },
}

impl ProviderOutcome {
    pub fn model(&self) -> &str {
        match self {
            ProviderOutcome::Completed(report) => &report.model,
            ProviderOutcome::Failed { model, .. } => model,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ProviderOutcome::Failed { .. })
    }

    /// Report handed to the solver; failures degrade to an error summary
    pub fn into_report(self) -> ProviderReport {
        match self {
            ProviderOutcome::Completed(report) => report,
            ProviderOutcome::Failed { model, error } => ProviderReport {
                model,
                search_query: ERROR_SEARCH_QUERY.to_string(),
                summary: format!("Error: {}", error),
                refs: Vec::new(),
            },
        }
    }
}

/// Runs one provider through query generation, search and summarisation.
pub struct ProviderPipeline {
    llm_factory: Arc<dyn LLMClientFactory>,
    search: Arc<dyn WebSearch>,
    settings: PipelineSettings,
}

impl ProviderPipeline {
    pub fn new(
        llm_factory: Arc<dyn LLMClientFactory>,
        search: Arc<dyn WebSearch>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            llm_factory,
            search,
            settings,
        }
    }

    /// Run the pipeline for one provider.
    pub async fn run(&self, provider: &ProviderConfig, user_message: &str) -> ProviderOutcome {
        info!(model = %provider.model, "Provider pipeline started");

        match self.try_run(provider, user_message).await {
            Ok(report) => {
                info!(
                    model = %provider.model,
                    refs = report.refs.len(),
                    "Provider pipeline finished"
                );
                ProviderOutcome::Completed(report)
            }
            Err(e) => {
                warn!(model = %provider.model, "Provider pipeline failed: {}", e);
                ProviderOutcome::Failed {
                    model: provider.model.clone(),
                    error: e.to_string(),
                }
            }
        }
    }

    async fn try_run(
        &self,
        provider: &ProviderConfig,
        user_message: &str,
    ) -> Result<ProviderReport> {
        // The session is owned by this frame and released on every exit path
        let client = self.llm_factory.create(provider).await?;

        let search_query = self
            .generate_query(client.as_ref(), provider, user_message)
            .await?;
        debug!(model = %provider.model, query = %search_query, "Generated search query");

        let results = self
            .bounded(
                "web search",
                self.search.search(&search_query, self.settings.max_results),
            )
            .await?;

        if results.is_empty() {
            info!(model = %provider.model, "Search returned no results, skipping summary");
            return Ok(ProviderReport {
                model: provider.model.clone(),
                search_query,
                summary: NO_RESULTS_SUMMARY.to_string(),
                refs: Vec::new(),
            });
        }

        let context = prompts::context_block(&results, self.settings.context_results);
        let messages =
            prompts::summary_messages(user_message, &context, provider.merge_system_prompt);
        let summary = self
            .bounded("summarisation", client.complete(&messages))
            .await??;

        Ok(ProviderReport {
            model: provider.model.clone(),
            search_query,
            summary,
            refs: results,
        })
    }

    async fn generate_query(
        &self,
        client: &dyn LLMClient,
        provider: &ProviderConfig,
        user_message: &str,
    ) -> Result<String> {
        let messages = prompts::query_gen_messages(user_message, provider.merge_system_prompt);
        let raw = self
            .bounded("query generation", client.complete(&messages))
            .await??;

        let query = prompts::clean_search_query(&raw);
        if query.is_empty() {
            // Model produced nothing usable; search for the question itself
            Ok(user_message.trim().to_string())
        } else {
            Ok(query)
        }
    }

    async fn bounded<F: Future>(&self, stage: &str, fut: F) -> Result<F::Output> {
        tokio::time::timeout(self.settings.request_timeout, fut)
            .await
            .map_err(|_| {
                AppError::Timeout(self.settings.request_timeout.as_secs(), stage.to_string())
            })
    }
}
