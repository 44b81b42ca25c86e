use crate::llm::client::{ChatMessage, ChunkStream, LLMClient, LLMClientFactory, MessageRole};
use crate::types::{AppError, Result};
use crate::utils::toml_config::{PipelineConfig, ProviderConfig};
use async_openai::{
    Client,
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
};
use async_trait::async_trait;
use futures::StreamExt;
use std::time::Duration;

/// Client for OpenAI-compatible chat endpoints (OpenAI, DeepSeek, Moonshot, ...)
pub struct OpenAIClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAIClient {
    pub fn new(api_key: String, api_base: String, model: String) -> Self {
        Self::with_http_client(api_key, api_base, model, reqwest::Client::new())
    }

    pub fn with_http_client(
        api_key: String,
        api_base: String,
        model: String,
        http_client: reqwest::Client,
    ) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(api_base);

        Self {
            client: Client::with_config(config).with_http_client(http_client),
            model,
        }
    }

    fn request_messages(
        &self,
        messages: &[ChatMessage],
    ) -> Result<Vec<ChatCompletionRequestMessage>> {
        messages
            .iter()
            .map(|message| {
                let converted: ChatCompletionRequestMessage = match message.role {
                    MessageRole::System => ChatCompletionRequestSystemMessageArgs::default()
                        .content(message.content.clone())
                        .build()
                        .map_err(build_error)?
                        .into(),
                    MessageRole::User => ChatCompletionRequestUserMessageArgs::default()
                        .content(message.content.clone())
                        .build()
                        .map_err(build_error)?
                        .into(),
                    MessageRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                        .content(message.content.clone())
                        .build()
                        .map_err(build_error)?
                        .into(),
                };
                Ok(converted)
            })
            .collect()
    }
}

fn build_error(e: OpenAIError) -> AppError {
    AppError::LLM(format!("Failed to build request: {}", e))
}

#[async_trait]
impl LLMClient for OpenAIClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(self.request_messages(messages)?)
            .build()
            .map_err(build_error)?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| AppError::LLM(format!("OpenAI API error: {}", e)))?;

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| AppError::LLM(format!("No response from {}", self.model)))
    }

    async fn complete_stream(&self, messages: &[ChatMessage]) -> Result<ChunkStream> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(self.request_messages(messages)?)
            .build()
            .map_err(build_error)?;

        let mut stream = self
            .client
            .chat()
            .create_stream(request)
            .await
            .map_err(|e| AppError::LLM(format!("OpenAI API error: {}", e)))?;

        let result_stream = async_stream::stream! {
            while let Some(result) = stream.next().await {
                match result {
                    Ok(response) => {
                        for choice in response.choices {
                            if let Some(content) = choice.delta.content {
                                yield Ok(content);
                            }
                        }
                    }
                    Err(e) => {
                        yield Err(AppError::LLM(format!("Stream error: {}", e)));
                        break;
                    }
                }
            }
        };

        Ok(Box::pin(result_stream))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Opens an [`OpenAIClient`] per provider call-site.
///
/// Only the connect phase is bounded here; whole-request deadlines are applied
/// by the caller so long streams are not cut off mid-answer.
#[derive(Debug, Clone)]
pub struct OpenAIClientFactory {
    connect_timeout: Duration,
}

impl OpenAIClientFactory {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }

    /// Factory using the `[pipeline]` connect timeout
    pub fn from_config(pipeline: &PipelineConfig) -> Self {
        Self::new(pipeline.connect_timeout())
    }
}

impl Default for OpenAIClientFactory {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

#[async_trait]
impl LLMClientFactory for OpenAIClientFactory {
    async fn create(&self, provider: &ProviderConfig) -> Result<Box<dyn LLMClient>> {
        let api_key = provider.api_key.clone().ok_or_else(|| {
            AppError::Configuration(format!(
                "Missing API key for model '{}' (env {})",
                provider.model, provider.api_key_env
            ))
        })?;

        let http_client = reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Box::new(OpenAIClient::with_http_client(
            api_key,
            provider.base_url.clone(),
            provider.model.clone(),
            http_client,
        )))
    }
}
