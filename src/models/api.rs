use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::job::{JobPhase, TranslationJob};

/// Response after accepting a document for translation.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub status: String,
    pub message: String,
    pub task_id: Uuid,
    pub check_status_url: String,
}

/// Response for querying translation task status.
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskStatusResponse {
    pub task_id: Uuid,
    pub filename: String,
    pub target_lang: String,
    pub status: JobPhase,
    pub progress: u8,
    pub created_at: DateTime<Utc>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl TaskStatusResponse {
    pub fn from_job(job: &TranslationJob) -> Self {
        let (message, download_url, error_message) = match job.phase {
            JobPhase::Completed => (
                "Translation completed successfully.".to_string(),
                job.result_filename
                    .as_ref()
                    .map(|f| format!("/download/{f}")),
                None,
            ),
            JobPhase::Failed => (
                "Translation failed.".to_string(),
                None,
                job.error.clone(),
            ),
            JobPhase::Pending => (
                "Translation pending, waiting to start.".to_string(),
                None,
                None,
            ),
            _ => (
                format!("Translation in progress... {}%", job.progress),
                None,
                None,
            ),
        };

        Self {
            task_id: job.id,
            filename: job.filename.clone(),
            target_lang: job.target_lang.clone(),
            status: job.phase,
            progress: job.progress,
            created_at: job.created_at,
            message,
            download_url,
            error_message,
        }
    }
}
