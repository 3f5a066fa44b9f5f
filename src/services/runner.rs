use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::models::job::{JobPhase, TranslationJob};
use crate::services::clock::Clock;
use crate::services::progress::{self, ProgressPolicy};
use crate::services::provider::{provider_lang_code, RemoteState, TranslationProvider};
use crate::services::registry::JobRegistry;
use crate::services::storage::{output_filename, FileStore, TempFileGuard};

/// Tuning for the per-job state machine.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Source language code sent to the provider.
    pub source_lang: String,
    /// Delay between provider status polls.
    pub poll_interval: Duration,
    /// Hard ceiling on total polling time before the job fails.
    pub max_wait: Duration,
    /// Granularity of the cosmetic progress ramps.
    pub ramp_step: Duration,
    pub progress: ProgressPolicy,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            source_lang: "PT".to_string(),
            poll_interval: Duration::from_secs(2),
            max_wait: Duration::from_secs(3600),
            ramp_step: Duration::from_millis(500),
            progress: ProgressPolicy::default(),
        }
    }
}

/// Drives one translation job through submit → poll → fetch.
///
/// Each job gets its own spawned task. Every failure inside the task,
/// panics included, is converted into the job's terminal `Failed` phase;
/// the task never ends with the record stuck in a non-terminal phase, and
/// the uploaded source file is removed on every exit path.
#[derive(Clone)]
pub struct JobRunner {
    registry: Arc<JobRegistry>,
    provider: Arc<dyn TranslationProvider>,
    storage: Arc<FileStore>,
    clock: Arc<dyn Clock>,
    config: RunnerConfig,
}

impl JobRunner {
    pub fn new(
        registry: Arc<JobRegistry>,
        provider: Arc<dyn TranslationProvider>,
        storage: Arc<FileStore>,
        clock: Arc<dyn Clock>,
        config: RunnerConfig,
    ) -> Self {
        Self {
            registry,
            provider,
            storage,
            clock,
            config,
        }
    }

    /// Launch the state machine for one job as an independent task.
    pub fn spawn(
        &self,
        job: TranslationJob,
        upload_path: std::path::PathBuf,
    ) -> tokio::task::JoinHandle<()> {
        let runner = self.clone();
        tokio::spawn(async move {
            // Owns the uploaded source for the whole task; dropped (and the
            // file removed) no matter which exit path is taken.
            let upload = TempFileGuard::new(upload_path);

            metrics::counter!("translation_jobs_total").increment(1);
            let started = runner.clock.monotonic();
            let job_id = job.id;
            let pristine = job.clone();

            // The state machine runs in a nested task so that a panic
            // anywhere inside it is contained here and still ends in a
            // published terminal phase.
            let worker = {
                let runner = runner.clone();
                let path = upload.path().to_path_buf();
                let mut job = job;
                tokio::spawn(async move {
                    let result = runner.drive(&mut job, &path).await;
                    (job, result)
                })
            };

            match worker.await {
                Ok((_, Ok(()))) => {
                    let duration = runner.clock.monotonic() - started;
                    metrics::counter!("translation_jobs_completed").increment(1);
                    metrics::histogram!("translation_duration_seconds")
                        .record(duration.as_secs_f64());
                    tracing::info!(
                        job_id = %job_id,
                        duration_secs = duration.as_secs(),
                        "translation job completed"
                    );
                }
                Ok((mut job, Err(e))) => {
                    metrics::counter!("translation_jobs_failed").increment(1);
                    tracing::error!(job_id = %job_id, error = %e, "translation job failed");
                    job.fail(e.to_string());
                    runner.registry.publish(job);
                }
                Err(panic) => {
                    metrics::counter!("translation_jobs_failed").increment(1);
                    tracing::error!(job_id = %job_id, error = %panic, "translation job panicked");
                    let mut job = runner
                        .registry
                        .get(job_id)
                        .map(|j| (*j).clone())
                        .unwrap_or(pristine);
                    job.fail(format!("internal error: {panic}"));
                    runner.registry.publish(job);
                }
            }
        })
    }

    async fn drive(&self, job: &mut TranslationJob, upload_path: &Path) -> Result<(), JobError> {
        let policy = &self.config.progress;

        // Pending → Submitting: early visible feedback before any remote
        // signal exists.
        job.set_phase(JobPhase::Submitting);
        self.registry.publish(job.clone());
        self.run_ramp(job, policy.pre_submit_ramp, |e| policy.pre_submit(e))
            .await;

        let bytes = tokio::fs::read(upload_path)
            .await
            .map_err(|e| JobError::Submit(e.to_string()))?;

        tracing::debug!(job_id = %job.id, bytes = bytes.len(), "submitting document to provider");
        let handle = self
            .provider
            .submit_document(
                bytes,
                &job.filename,
                &self.config.source_lang,
                provider_lang_code(&job.target_lang),
            )
            .await
            .map_err(|e| JobError::Submit(e.to_string()))?;

        // Submitting → Polling: acknowledge the upload, then track the
        // remote side.
        job.set_phase(JobPhase::Polling);
        self.registry.publish(job.clone());
        self.run_ramp(job, policy.post_submit_ramp, |e| policy.post_submit(e))
            .await;

        let polling_started = self.clock.monotonic();
        loop {
            let status = self
                .provider
                .poll_status(&handle)
                .await
                .map_err(|e| JobError::Poll(e.to_string()))?;
            let elapsed = self.clock.monotonic() - polling_started;

            if elapsed > self.config.max_wait {
                return Err(JobError::Timeout);
            }

            match status.state {
                RemoteState::Done => break,
                RemoteState::Error => {
                    return Err(JobError::Remote(status.message.unwrap_or_else(|| {
                        "unknown translation error".to_string()
                    })));
                }
                RemoteState::Translating | RemoteState::Queued => {
                    let eta = status.seconds_remaining.map(Duration::from_secs);
                    if let Some(p) = policy.polling(elapsed, eta) {
                        job.advance_progress(p);
                        self.registry.publish(job.clone());
                    }
                    self.clock.sleep(self.config.poll_interval).await;
                }
                RemoteState::Unknown(raw) => return Err(JobError::UnexpectedState(raw)),
            }
        }

        // Polling → Finalizing: fetch and persist the result.
        job.set_phase(JobPhase::Finalizing);
        self.registry.publish(job.clone());

        // A job that finished suspiciously fast is stretched out to the
        // minimum processing time before the final ramp.
        let elapsed = self.clock.monotonic() - polling_started;
        let hold = policy.completion_hold(elapsed);
        if !hold.is_zero() {
            let from = job.progress;
            let ceiling = policy.polling_ceiling;
            self.run_ramp(job, hold, |e| progress::ramp(from, ceiling, e, hold))
                .await;
        }

        // The last point is withheld until the result is actually on disk.
        let span = policy.final_ramp;
        self.run_ramp(job, span, |e| policy.finalizing(e).min(99)).await;

        let result_name = output_filename(&job.filename, &job.target_lang);
        let stream = self
            .provider
            .fetch_result(&handle)
            .await
            .map_err(|e| JobError::Fetch(e.to_string()))?;
        self.storage
            .write_output_stream(&result_name, stream)
            .await
            .map_err(|e| JobError::Fetch(e.to_string()))?;

        job.complete(result_name);
        self.registry.publish(job.clone());
        Ok(())
    }

    /// Step progress through `estimate(elapsed)` in small sleeps until
    /// `span` has passed, publishing each advance.
    async fn run_ramp(
        &self,
        job: &mut TranslationJob,
        span: Duration,
        estimate: impl Fn(Duration) -> u8,
    ) {
        let start = self.clock.monotonic();
        loop {
            let elapsed = self.clock.monotonic() - start;
            job.advance_progress(estimate(elapsed));
            self.registry.publish(job.clone());
            if elapsed >= span {
                return;
            }
            self.clock.sleep(self.config.ramp_step.min(span - elapsed)).await;
        }
    }
}

/// Everything that can end a job in `Failed`. The display strings become
/// the user-visible failure reasons.
#[derive(Debug, thiserror::Error)]
enum JobError {
    #[error("submission failed: {0}")]
    Submit(String),

    #[error("status poll failed: {0}")]
    Poll(String),

    #[error("translation error: {0}")]
    Remote(String),

    #[error("unexpected remote state: {0}")]
    UnexpectedState(String),

    #[error("timeout exceeded")]
    Timeout,

    #[error("result retrieval failed: {0}")]
    Fetch(String),
}
