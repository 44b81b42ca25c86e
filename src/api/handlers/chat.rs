use crate::{
    AppState,
    research::coordinator::ResearchCoordinator,
    types::{AppError, ChatRequest, Result, SyncChatResponse, SyncReference},
};
use axum::{
    Json,
    body::Body,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::debug;

pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

fn require_message(payload: &ChatRequest) -> Result<()> {
    if payload.msg.trim().is_empty() {
        return Err(AppError::InvalidInput("msg must not be empty".to_string()));
    }
    if payload.kind != "text" {
        debug!(kind = %payload.kind, "Treating non-text message as text");
    }
    Ok(())
}

/// Research a question with every configured model and stream the merged answer
#[utoipa::path(
    post,
    path = "/api/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "NDJSON stream of status, sources, content and error events", body = String, content_type = "application/x-ndjson"),
        (status = 400, description = "Invalid input")
    ),
    tag = "chat"
)]
pub async fn chat(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Response> {
    require_message(&payload)?;

    let config = state.config_manager.config();
    let coordinator = ResearchCoordinator::from_config(
        &config,
        Arc::clone(&state.llm_factory),
        Arc::clone(&state.search),
    );
    let mut events = coordinator.spawn(payload.msg, config.pipeline.event_buffer);

    // Dropping the body on disconnect drops the receiver and cancels the run
    let body = async_stream::stream! {
        while let Some(event) = events.recv().await {
            yield Ok::<_, Infallible>(event.to_ndjson());
        }
    };

    Ok((
        [
            (header::CONTENT_TYPE, NDJSON_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(body),
    )
        .into_response())
}

/// Research a question with the solver model only and return the report
#[utoipa::path(
    post,
    path = "/api/chat/sync",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Single-model research report", body = SyncChatResponse),
        (status = 400, description = "Invalid input"),
        (status = 500, description = "Configuration or model failure")
    ),
    tag = "chat"
)]
pub async fn chat_sync(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<SyncChatResponse>> {
    require_message(&payload)?;

    let config = state.config_manager.config();
    let coordinator = ResearchCoordinator::from_config(
        &config,
        Arc::clone(&state.llm_factory),
        Arc::clone(&state.search),
    );

    let report = coordinator.research_single(&payload.msg).await?;

    Ok(Json(SyncChatResponse {
        flow: report.summary,
        refs: report
            .refs
            .into_iter()
            .map(|r| SyncReference {
                txt: r.title,
                link: r.url,
            })
            .collect(),
    }))
}
