//! Parallel multi-model research
//!
//! A question is handed to every configured research provider at once. Each
//! provider independently writes a search query, searches the web and
//! summarises what it found. The solver model then merges the reports into
//! one streamed answer.
//!
//! # Architecture
//!
//! - [`coordinator::ResearchCoordinator`] - fans out, merges and emits events
//! - [`pipeline::ProviderPipeline`] - query generation, search, summary for one provider
//! - [`solver::Solver`] - streams the final synthesis
//! - [`prompts`] - stage prompt templates
//! - [`events::StreamEvent`] - NDJSON records sent to the client
//!
//! # Usage
//!
//! ```ignore
//! use council::research::coordinator::ResearchCoordinator;
//!
//! let coordinator = ResearchCoordinator::from_config(&config, llm_factory, search);
//! let mut events = coordinator.spawn("What is new in quantum computing?".to_string(), 32);
//!
//! while let Some(event) = events.recv().await {
//!     print!("{}", event.to_ndjson());
//! }
//! ```
//!
//! # Event order
//!
//! 1. `status` with the number of dispatched providers
//! 2. one `status` per provider report, in configuration order
//! 3. `sources` with every provider's references
//! 4. `status` announcing the synthesis
//! 5. `content` chunks of the final answer
//!
//! Configuration problems and solver failures end the stream with `error`.

/// Fan-out, merge and event emission.
pub mod coordinator;
/// Stream events and their wire encoding.
pub mod events;
/// Single-provider research pipeline.
pub mod pipeline;
/// Prompt templates.
pub mod prompts;
/// Final synthesis.
pub mod solver;
