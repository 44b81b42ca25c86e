use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ============= API Request/Response Types =============

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChatRequest {
    /// The user's question
    pub msg: String,
    /// Message kind; only `"text"` is produced by the bundled client
    #[serde(rename = "type", default = "default_message_type")]
    pub kind: String,
}

fn default_message_type() -> String {
    "text".to_string()
}

/// Response body of the non-streaming single-model chat route
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SyncChatResponse {
    pub flow: String,
    pub refs: Vec<SyncReference>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct SyncReference {
    pub txt: String,
    pub link: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub providers: usize,
    pub search: String,
}

// ============= Research Types =============

/// One hit returned by the search capability.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub title: String,
    pub content: String,
    pub url: String,
}

/// Display-ready citation for the `sources` event.
///
/// Serialized as `{"title", "url"}`, the shape the browser client renders.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct Reference {
    #[serde(rename = "title")]
    pub label: String,
    pub url: String,
}

impl Reference {
    /// Build a reference from a search hit, labelled with the model that found it.
    pub fn from_result(model: &str, result: &SearchResult) -> Self {
        let url = if result.url.trim().is_empty() {
            "#".to_string()
        } else {
            result.url.clone()
        };

        Self {
            label: format!("[{}] {}", model, result.title),
            url,
        }
    }
}

/// Output of one provider pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderReport {
    pub model: String,
    pub search_query: String,
    pub summary: String,
    pub refs: Vec<SearchResult>,
}

impl ProviderReport {
    /// Narrative block handed to the solver.
    pub fn narrative(&self) -> String {
        format!(
            "=== Expert report ({}) ===\nSearch query: {}\nConclusion: {}\n",
            self.model, self.search_query, self.summary
        )
    }

    /// References for this report, in search order.
    pub fn references(&self) -> Vec<Reference> {
        self.refs
            .iter()
            .map(|r| Reference::from_result(&self.model, r))
            .collect()
    }
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("LLM error: {0}")]
    LLM(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Timed out after {0}s: {1}")]
    Timeout(u64, String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match self {
            AppError::InvalidInput(_) => axum::http::StatusCode::BAD_REQUEST,
            _ => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = serde_json::json!({
            "error": self.to_string()
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
