//! LLM client abstractions
//!
//! The research pipeline only needs two capabilities from a chat model:
//! a single completion and a streamed completion. Both are expressed by the
//! [`LLMClient`] trait. Clients are opened per call-site through an
//! [`LLMClientFactory`] and released when dropped.

use crate::types::Result;
use crate::utils::toml_config::ProviderConfig;
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

/// Stream of text deltas produced by a streaming completion
pub type ChunkStream = BoxStream<'static, Result<String>>;

/// Role of a chat message sender.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instructions.
    System,
    /// User message.
    User,
    /// Assistant response.
    Assistant,
}

/// A single chat turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Chat-completion capability
///
/// Implementations may fail on authentication or network errors; callers
/// decide whether that failure is isolated or fatal.
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Run a completion and return the full reply text
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Run a streaming completion and return the reply as text deltas
    async fn complete_stream(&self, messages: &[ChatMessage]) -> Result<ChunkStream>;

    /// Get the model name/identifier
    fn model_name(&self) -> &str;
}

/// Opens a client session for one provider.
///
/// A session lives exactly as long as the returned box; it is never pooled or
/// shared across provider tasks.
#[async_trait]
pub trait LLMClientFactory: Send + Sync {
    async fn create(&self, provider: &ProviderConfig) -> Result<Box<dyn LLMClient>>;
}
