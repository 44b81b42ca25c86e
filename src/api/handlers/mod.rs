//! API request handlers.

/// Streaming and single-model research handlers.
pub mod chat;
/// Health check handler.
pub mod health;
