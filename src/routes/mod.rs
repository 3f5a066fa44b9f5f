pub mod download;
pub mod health;
pub mod metrics;
pub mod translate;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::app_state::AppState;

/// API routes. Metrics and middleware layers are attached in `main`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/translate", post(translate::submit_translation))
        .route("/task/{id}", get(translate::task_status))
        .route("/download/{filename}", get(download::download_file))
        .with_state(state)
}

/// Synchronous request failures, rendered as `{"status": "nok", ...}`
/// bodies matching the rest of the API surface.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(serde_json::json!({
            "status": "nok",
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}
