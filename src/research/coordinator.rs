//! Fan-out of one question across every research provider.
//!
//! The coordinator checks the configuration, runs each provider pipeline in
//! its own task, merges the reports in provider order and streams the
//! solver's answer as [`StreamEvent`]s. Closing the receiver cancels the
//! outstanding provider tasks and the solver stream.

use crate::llm::LLMClientFactory;
use crate::research::events::StreamEvent;
use crate::research::pipeline::{PipelineSettings, ProviderOutcome, ProviderPipeline};
use crate::research::solver::Solver;
use crate::tools::search::WebSearch;
use crate::types::{AppError, ProviderReport, Result};
use crate::utils::toml_config::{CouncilConfig, ProviderConfig};
use futures::StreamExt;
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{Instrument, error, info, warn};

/// The consumer went away; nothing more should be produced.
#[derive(Debug)]
struct Disconnected;

/// Aborts the provider tasks when the fan-out is dropped mid-flight.
struct AbortOnDrop(Vec<AbortHandle>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        for handle in &self.0 {
            handle.abort();
        }
    }
}

/// Fans a question out to every configured provider and streams the merged answer.
pub struct ResearchCoordinator {
    pipeline: Arc<ProviderPipeline>,
    solver: Solver,
    providers: Vec<ProviderConfig>,
    solver_provider: Option<ProviderConfig>,
}

impl ResearchCoordinator {
    pub fn new(
        pipeline: Arc<ProviderPipeline>,
        solver: Solver,
        providers: Vec<ProviderConfig>,
        solver_provider: Option<ProviderConfig>,
    ) -> Self {
        Self {
            pipeline,
            solver,
            providers,
            solver_provider,
        }
    }

    /// Build a coordinator from a configuration snapshot
    pub fn from_config(
        config: &CouncilConfig,
        llm_factory: Arc<dyn LLMClientFactory>,
        search: Arc<dyn WebSearch>,
    ) -> Self {
        let settings = PipelineSettings::from_config(config);
        let solver = Solver::new(Arc::clone(&llm_factory), settings.request_timeout);
        let pipeline = Arc::new(ProviderPipeline::new(llm_factory, search, settings));

        Self::new(
            pipeline,
            solver,
            config.research_providers(),
            config.solver_provider(),
        )
    }

    /// Spawn the research for `message` and return the event receiver.
    ///
    /// Dropping the receiver cancels all outstanding work.
    pub fn spawn(self, message: String, buffer: usize) -> mpsc::Receiver<StreamEvent> {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let request_id = uuid::Uuid::new_v4();
        info!(
            %request_id,
            providers = self.providers.len(),
            "Starting streamed research"
        );

        let span = tracing::info_span!("research", %request_id);
        tokio::spawn(self.run(message, tx).instrument(span));
        rx
    }

    /// Produce the full event sequence for one request into `tx`.
    ///
    /// Returns early, dropping in-flight provider tasks and the solver
    /// stream, as soon as the receiving side is closed.
    pub async fn run(self, message: String, tx: mpsc::Sender<StreamEvent>) {
        tokio::select! {
            _ = tx.closed() => {
                info!("Client disconnected, cancelling research");
            }
            result = self.drive(&message, &tx) => {
                if result.is_err() {
                    info!("Client disconnected, research stopped");
                }
            }
        }
    }

    async fn drive(
        &self,
        message: &str,
        tx: &mpsc::Sender<StreamEvent>,
    ) -> std::result::Result<(), Disconnected> {
        let solver_provider = match self.preflight() {
            Ok(solver_provider) => solver_provider,
            Err(e) => {
                warn!("Rejecting research request: {}", e);
                return emit(tx, StreamEvent::error(configuration_message(&e))).await;
            }
        };

        emit(
            tx,
            StreamEvent::status(format!(
                "Dispatching {} AI experts for parallel research...",
                self.providers.len()
            )),
        )
        .await?;

        let outcomes = self.fan_out(message).await;

        let mut sources = Vec::new();
        let mut reports = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            if outcome.is_failure() {
                warn!(model = outcome.model(), "Provider degraded to an error report");
            }
            let report = outcome.into_report();
            emit(
                tx,
                StreamEvent::status(format!("Expert report ({}) is ready", report.model)),
            )
            .await?;
            sources.extend(report.references());
            reports.push(report.narrative());
        }

        emit(tx, StreamEvent::Sources(sources)).await?;
        emit(
            tx,
            StreamEvent::status("Lead analyst is writing the final report..."),
        )
        .await?;

        let mut chunks = match self.solver.stream(solver_provider, message, &reports).await {
            Ok(chunks) => chunks,
            Err(e) => {
                error!("Final synthesis failed to start: {}", e);
                return emit(
                    tx,
                    StreamEvent::error(format!("Final synthesis failed: {}", e)),
                )
                .await;
            }
        };

        let mut produced = 0usize;
        while let Some(chunk) = chunks.next().await {
            match chunk {
                Ok(text) => {
                    produced += 1;
                    emit(tx, StreamEvent::Content(text)).await?;
                }
                Err(e) => {
                    error!("Final synthesis failed mid-stream: {}", e);
                    return emit(
                        tx,
                        StreamEvent::error(format!("Final synthesis failed: {}", e)),
                    )
                    .await;
                }
            }
        }

        if produced == 0 {
            warn!("Solver stream ended without content");
            emit(tx, StreamEvent::error("Final synthesis produced no content")).await?;
        }

        info!(chunks = produced, "Research request completed");
        Ok(())
    }

    /// Check the configuration before any work starts.
    fn preflight(&self) -> Result<&ProviderConfig> {
        if self.providers.is_empty() {
            return Err(AppError::Configuration(
                "No search models configured, check the configuration".to_string(),
            ));
        }

        let solver = self.solver_provider.as_ref().ok_or_else(|| {
            AppError::Configuration("No solver model configured".to_string())
        })?;

        for provider in self.providers.iter().chain(std::iter::once(solver)) {
            if provider.api_key.is_none() {
                return Err(AppError::Configuration(format!(
                    "Missing API key for model '{}' (env {})",
                    provider.model, provider.api_key_env
                )));
            }
        }

        Ok(solver)
    }

    /// Run every provider concurrently and return outcomes in provider order.
    async fn fan_out(&self, message: &str) -> Vec<ProviderOutcome> {
        let handles: Vec<_> = self
            .providers
            .iter()
            .cloned()
            .map(|provider| {
                let pipeline = Arc::clone(&self.pipeline);
                let message = message.to_string();
                tokio::spawn(
                    async move { pipeline.run(&provider, &message).await }.in_current_span(),
                )
            })
            .collect();

        let _guard = AbortOnDrop(handles.iter().map(|h| h.abort_handle()).collect());

        join_all(handles)
            .await
            .into_iter()
            .zip(&self.providers)
            .map(|(joined, provider)| match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(model = %provider.model, "Provider task aborted: {}", e);
                    ProviderOutcome::Failed {
                        model: provider.model.clone(),
                        error: format!("provider task failed: {}", e),
                    }
                }
            })
            .collect()
    }

    /// Single-model research without fan-out, using the solver provider.
    pub async fn research_single(&self, message: &str) -> Result<ProviderReport> {
        let provider = self.solver_provider.as_ref().ok_or_else(|| {
            AppError::Configuration("No solver model configured".to_string())
        })?;

        match self.pipeline.run(provider, message).await {
            ProviderOutcome::Completed(report) => Ok(report),
            ProviderOutcome::Failed { error, .. } => Err(AppError::LLM(error)),
        }
    }
}

async fn emit(
    tx: &mpsc::Sender<StreamEvent>,
    event: StreamEvent,
) -> std::result::Result<(), Disconnected> {
    tx.send(event).await.map_err(|_| Disconnected)
}

fn configuration_message(e: &AppError) -> String {
    match e {
        AppError::Configuration(message) => message.clone(),
        other => other.to_string(),
    }
}
