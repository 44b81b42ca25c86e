//! # Ares Council - parallel multi-model research server
//!
//! A question is researched by several LLM providers at once. Each provider
//! writes its own web search query, searches and summarises independently;
//! a lead "solver" model then merges the reports into one answer that is
//! streamed to the client as newline-delimited JSON.
//!
//! ## Overview
//!
//! Ares Council can be used in two ways:
//!
//! 1. **As a standalone server** - Run the `council-server` binary
//! 2. **As a library** - Drive [`ResearchCoordinator`] from your own code
//!
//! ## Library Usage
//!
//! ```rust,ignore
//! use council::{ConfigManager, OpenAIClientFactory, ResearchCoordinator};
//! use council::tools::search::search_from_config;
//! use std::sync::Arc;
//!
//! let manager = ConfigManager::new("council.toml")?;
//! let config = manager.config();
//! let search = search_from_config(&config.search)?;
//! let coordinator =
//!     ResearchCoordinator::from_config(&config, Arc::new(OpenAIClientFactory::default()), search);
//!
//! let mut events = coordinator.spawn("What is new in battery chemistry?".to_string(), 32);
//! while let Some(event) = events.recv().await {
//!     print!("{}", event.to_ndjson());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`api`] - REST API handlers and routes
//! - [`llm`] - Chat-completion clients
//! - [`research`] - Provider pipelines, fan-out and final synthesis
//! - [`tools`] - Web search backends
//! - [`types`] - Common types and error handling
//! - [`utils`] - TOML configuration with hot reload

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

/// HTTP API handlers and routes.
pub mod api;
/// Command-line interface for the server binary.
pub mod cli;
/// LLM provider clients and abstractions.
pub mod llm;
/// Parallel research and synthesis.
pub mod research;
/// Web search backends.
pub mod tools;
/// Core types (requests, responses, errors).
pub mod types;
/// Configuration utilities.
pub mod utils;

// Re-export commonly used types
pub use llm::{ChatMessage, LLMClient, LLMClientFactory, OpenAIClient, OpenAIClientFactory};
pub use research::coordinator::ResearchCoordinator;
pub use research::events::StreamEvent;
pub use tools::search::WebSearch;
pub use types::{AppError, Result};
pub use utils::toml_config::{ConfigManager, CouncilConfig, ProviderConfig};

use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// TOML configuration with hot-reload support
    pub config_manager: Arc<ConfigManager>,
    /// Opens one chat-completion session per call-site
    pub llm_factory: Arc<dyn LLMClientFactory>,
    /// Search backend shared by every provider pipeline
    pub search: Arc<dyn WebSearch>,
}
