use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;

use crate::app_state::AppState;
use crate::routes::ApiError;

/// GET /download/{filename} — serve a translated document as an attachment.
///
/// The requested name is sanitized and checked for traversal before any
/// filesystem access; a rejected name never reaches the lookup.
pub async fn download_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let path = state
        .storage
        .resolve_download(&filename)
        .map_err(|_| ApiError::BadRequest("Invalid file name.".to_string()))?;

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(requested = %filename, "download of missing file");
            return Err(ApiError::NotFound("File not found.".to_string()));
        }
        Err(e) => {
            tracing::error!(requested = %filename, error = %e, "failed to read download");
            return Err(ApiError::Internal(
                "Internal error while serving download.".to_string(),
            ));
        }
    };

    // Suggest the name the client asked for, stripped of anything that
    // would break the header.
    let suggested: String = filename
        .chars()
        .filter(|c| !matches!(c, '"' | '\r' | '\n'))
        .collect();

    Ok((
        [
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{suggested}\""),
            ),
            (
                header::CONTENT_TYPE,
                "application/octet-stream".to_string(),
            ),
        ],
        bytes,
    ))
}
