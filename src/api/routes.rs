use crate::AppState;
use crate::api::handlers::{chat, health};
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(chat::chat, chat::chat_sync, health::health),
    components(schemas(
        crate::types::ChatRequest,
        crate::types::SyncChatResponse,
        crate::types::SyncReference,
        crate::types::HealthResponse,
        crate::types::Reference,
    )),
    tags(
        (name = "chat", description = "Parallel multi-model research"),
        (name = "health", description = "Service status")
    )
)]
pub struct ApiDoc;

/// Routes mounted under `/api`
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/chat", post(chat::chat))
        .route("/chat/sync", post(chat::chat_sync))
        .route("/health", get(health::health))
}

/// Full application router with tracing and CORS layers
pub fn create_router(state: AppState) -> Router {
    let cors_permissive = state.config_manager.config().server.cors_permissive;

    let router = Router::new()
        .nest("/api", api_routes())
        .route(
            "/api-docs/openapi.json",
            get(|| async { axum::Json(ApiDoc::openapi()) }),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if cors_permissive {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    }
}
