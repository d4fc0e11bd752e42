use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("could not understand the date or time in: {0}")]
    Parse(String),

    #[error("no event titled '{title}' found")]
    NotFound { title: String },

    #[error("calendar backend error: {0}")]
    Backend(String),

    #[error("could not determine what you're asking for")]
    AmbiguousInput,
}

impl IntoResponse for AgentError {
    fn into_response(self) -> Response {
        let status = match &self {
            AgentError::Parse(_) => StatusCode::BAD_REQUEST,
            AgentError::NotFound { .. } => StatusCode::NOT_FOUND,
            AgentError::Backend(_) => StatusCode::BAD_GATEWAY,
            AgentError::AmbiguousInput => StatusCode::BAD_REQUEST,
        };

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
