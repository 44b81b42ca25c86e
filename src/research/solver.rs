//! Final synthesis
//!
//! The solver turns the provider reports into one streamed answer. Unlike a
//! provider pipeline, a solver failure is fatal to the request.

use crate::llm::{ChunkStream, LLMClientFactory};
use crate::research::prompts;
use crate::types::{AppError, Result};
use crate::utils::toml_config::ProviderConfig;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub struct Solver {
    llm_factory: Arc<dyn LLMClientFactory>,
    chunk_timeout: Duration,
}

impl Solver {
    pub fn new(llm_factory: Arc<dyn LLMClientFactory>, chunk_timeout: Duration) -> Self {
        Self {
            llm_factory,
            chunk_timeout,
        }
    }

    /// Open the solver session and stream the final answer.
    ///
    /// Only non-empty chunks are forwarded. The session lives inside the
    /// returned stream and is released when the stream ends, fails or is
    /// dropped. Waiting longer than the chunk timeout for the next chunk ends
    /// the stream with [`AppError::Timeout`].
    pub async fn stream(
        &self,
        provider: &ProviderConfig,
        question: &str,
        reports: &[String],
    ) -> Result<ChunkStream> {
        let client = self.llm_factory.create(provider).await?;
        let messages = prompts::solver_messages(question, reports, provider.merge_system_prompt);

        info!(model = %provider.model, reports = reports.len(), "Starting final synthesis");

        let chunk_timeout = self.chunk_timeout;
        let mut upstream = tokio::time::timeout(chunk_timeout, client.complete_stream(&messages))
            .await
            .map_err(|_| {
                AppError::Timeout(chunk_timeout.as_secs(), "opening solver stream".to_string())
            })??;

        let model = provider.model.clone();
        let chunks = async_stream::stream! {
            let _session = client;
            loop {
                match tokio::time::timeout(chunk_timeout, upstream.next()).await {
                    Err(_) => {
                        yield Err(AppError::Timeout(
                            chunk_timeout.as_secs(),
                            "waiting for solver output".to_string(),
                        ));
                        break;
                    }
                    Ok(None) => break,
                    Ok(Some(Ok(chunk))) => {
                        if !chunk.is_empty() {
                            yield Ok(chunk);
                        }
                    }
                    Ok(Some(Err(e))) => {
                        yield Err(e);
                        break;
                    }
                }
            }
            debug!(model = %model, "Solver session closed");
        };

        Ok(Box::pin(chunks))
    }
}
