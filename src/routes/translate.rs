use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::models::api::{SubmitResponse, TaskStatusResponse};
use crate::routes::ApiError;
use crate::services::storage::split_name;

/// File types the provider accepts for document translation.
const ALLOWED_EXTENSIONS: &[&str] = &[
    ".docx", ".doc", ".pdf", ".pptx", ".xlsx", ".txt", ".html", ".htm",
];

/// POST /translate — accept a document and launch its translation job.
///
/// Returns 202 immediately; the job runs in its own task and is observed
/// through GET /task/{id}.
pub async fn submit_translation(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut target_lang = "en".to_string();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::BadRequest("Malformed multipart request.".to_string()))?
    {
        let name = field.name().map(ToString::to_string);
        match name.as_deref() {
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|_| ApiError::BadRequest("Could not read uploaded file.".to_string()))?;
                file = Some((filename, data.to_vec()));
            }
            Some("target_lang") => {
                target_lang = field
                    .text()
                    .await
                    .map_err(|_| ApiError::BadRequest("Could not read target_lang.".to_string()))?;
            }
            _ => {}
        }
    }

    let (filename, data) =
        file.ok_or_else(|| ApiError::BadRequest("No file provided.".to_string()))?;
    if filename.is_empty() {
        return Err(ApiError::BadRequest("No file selected.".to_string()));
    }

    let ext = split_name(&filename).1.to_ascii_lowercase();
    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(ApiError::BadRequest(format!(
            "Unsupported file format. Use: {}",
            ALLOWED_EXTENSIONS.join(", ")
        )));
    }

    tracing::info!(filename = %filename, target_lang = %target_lang, "translation request received");

    let job = state.registry.create(filename.clone(), target_lang);

    let upload_path = match state.storage.save_upload(job.id, &filename, &data).await {
        Ok(path) => path,
        Err(e) => {
            tracing::error!(job_id = %job.id, error = %e, "failed to store upload");
            let mut failed = (*job).clone();
            failed.fail(format!("could not store upload: {e}"));
            state.registry.publish(failed);
            return Err(ApiError::Internal(format!("Internal server error: {e}")));
        }
    };

    state.runner.spawn((*job).clone(), upload_path);

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            status: "ok".to_string(),
            message: "Translation started. Poll the task status periodically.".to_string(),
            task_id: job.id,
            check_status_url: format!("/task/{}", job.id),
        }),
    ))
}

/// GET /task/{id} — report phase and progress of a translation job.
pub async fn task_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TaskStatusResponse>, ApiError> {
    let id = Uuid::parse_str(&id)
        .map_err(|_| ApiError::NotFound("Translation task not found.".to_string()))?;

    let job = state
        .registry
        .get(id)
        .ok_or_else(|| ApiError::NotFound("Translation task not found.".to_string()))?;

    Ok(Json(TaskStatusResponse::from_job(&job)))
}
