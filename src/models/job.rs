use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Position of a translation job in its lifecycle.
///
/// `Completed` and `Failed` are terminal; a record in a terminal phase is
/// never mutated again.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobPhase {
    Pending,
    Submitting,
    Polling,
    Finalizing,
    Completed,
    Failed,
}

impl JobPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobPhase::Completed | JobPhase::Failed)
    }
}

/// One document translation request tracked from submission to terminal
/// outcome.
///
/// A job is mutated only by the single runner task bound to it. The runner
/// works on an owned copy and publishes whole records into the registry, so
/// concurrent status readers always observe a consistent snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationJob {
    pub id: Uuid,
    pub filename: String,
    pub target_lang: String,
    pub phase: JobPhase,
    pub progress: u8,
    pub result_filename: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TranslationJob {
    pub fn new(filename: String, target_lang: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            filename,
            target_lang,
            phase: JobPhase::Pending,
            progress: 0,
            result_filename: None,
            error: None,
            created_at: Utc::now(),
        }
    }

    /// Advance progress, never backward.
    pub fn advance_progress(&mut self, progress: u8) {
        self.progress = self.progress.max(progress.min(100));
    }

    pub fn set_phase(&mut self, phase: JobPhase) {
        self.phase = phase;
    }

    /// Terminal success transition. Progress jumps to 100 and the result
    /// filename becomes visible atomically with the phase change.
    pub fn complete(&mut self, result_filename: String) {
        self.phase = JobPhase::Completed;
        self.progress = 100;
        self.result_filename = Some(result_filename);
    }

    /// Terminal failure transition. Progress resets to 0 to signal that no
    /// usable result exists.
    pub fn fail(&mut self, reason: impl Into<String>) {
        self.phase = JobPhase::Failed;
        self.progress = 0;
        self.error = Some(reason.into());
    }
}
