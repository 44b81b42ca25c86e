//! LLM Provider Clients and Abstractions
//!
//! This module provides the chat-completion capability used by the research
//! pipeline. Provider specifics live behind the [`LLMClient`] trait so the
//! pipeline, the solver and the tests never depend on a concrete endpoint.
//!
//! # Architecture
//!
//! - [`LLMClient`] - Completion and streaming completion for one model
//! - [`LLMClientFactory`] - Opens a client session for a configured provider
//! - [`OpenAIClientFactory`] - Factory for OpenAI-compatible endpoints
//!
//! # Example
//!
//! ```ignore
//! use council::llm::{ChatMessage, LLMClientFactory, OpenAIClientFactory};
//!
//! let factory = OpenAIClientFactory::default();
//! let client = factory.create(&provider).await?;
//!
//! let reply = client
//!     .complete(&[ChatMessage::system("Be brief."), ChatMessage::user("What is 2+2?")])
//!     .await?;
//! println!("{}", reply);
//! ```
//!
//! # Streaming
//!
//! `complete_stream` returns a [`ChunkStream`], a boxed stream of text
//! deltas that owns its HTTP connection.

/// Core LLM client trait and message types.
pub mod client;
/// OpenAI-compatible client and factory.
pub mod openai;

pub use client::{ChatMessage, ChunkStream, LLMClient, LLMClientFactory, MessageRole};
pub use openai::{OpenAIClient, OpenAIClientFactory};
