//! HTTP API Handlers and Routes
//!
//! # Module Structure
//!
//! - [`api::handlers`](crate::api::handlers) - Request handlers for each endpoint
//! - [`api::routes`](crate::api::routes) - Route definitions and router configuration
//!
//! # API Endpoints
//!
//! ## Chat (`/api/chat`)
//! - `POST /api/chat` - Research with every configured model, NDJSON stream
//! - `POST /api/chat/sync` - Research with the solver model, single JSON body
//!
//! ## Health (`/api/health`)
//! - `GET /api/health` - Health check endpoint
//!
//! The OpenAPI document is served at `/api-docs/openapi.json`.

/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;
