use crate::{AppState, types::HealthResponse};
use axum::{Json, extract::State};

/// Liveness check with a summary of the loaded configuration
#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, description = "Server is up", body = HealthResponse)),
    tag = "health"
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let config = state.config_manager.config();

    Json(HealthResponse {
        status: "ok".to_string(),
        providers: config.providers.len(),
        search: state.search.name().to_string(),
    })
}
