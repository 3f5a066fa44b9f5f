//! Progress estimation for translation jobs.
//!
//! The remote provider exposes coarse status, not fine-grained progress, so
//! the visible percentage is a synthetic estimate: linear ramps around the
//! upload, an ETA-weighted curve while the provider works, and a final ramp
//! while the result is fetched. The estimate must be user-legible and never
//! go backward; monotonicity itself is enforced by the job record.

use std::time::Duration;

/// Tuning for the synthetic progress curve.
#[derive(Debug, Clone)]
pub struct ProgressPolicy {
    /// Ceiling of the ramp shown before the document is submitted.
    pub pre_submit_ceiling: u8,
    pub pre_submit_ramp: Duration,
    /// Ceiling of the ramp shown right after a successful submit.
    pub post_submit_ceiling: u8,
    pub post_submit_ramp: Duration,
    /// Highest value reachable before the result is actually fetched.
    pub polling_ceiling: u8,
    /// Jobs finishing faster than this are stretched out so completion does
    /// not look instant.
    pub min_processing: Duration,
    /// Length of the final ramp from the polling ceiling to 100.
    pub final_ramp: Duration,
}

impl Default for ProgressPolicy {
    fn default() -> Self {
        Self {
            pre_submit_ceiling: 10,
            pre_submit_ramp: Duration::from_secs(5),
            post_submit_ceiling: 20,
            post_submit_ramp: Duration::from_secs(5),
            polling_ceiling: 90,
            min_processing: Duration::from_secs(20),
            final_ramp: Duration::from_secs(2),
        }
    }
}

impl ProgressPolicy {
    /// Progress while waiting to submit: 0 up to `pre_submit_ceiling`,
    /// linear over `pre_submit_ramp`.
    pub fn pre_submit(&self, elapsed: Duration) -> u8 {
        ramp(0, self.pre_submit_ceiling, elapsed, self.pre_submit_ramp)
    }

    /// Progress right after a successful submit: `pre_submit_ceiling` up to
    /// `post_submit_ceiling`, linear over `post_submit_ramp`.
    pub fn post_submit(&self, since_submit: Duration) -> u8 {
        ramp(
            self.pre_submit_ceiling,
            self.post_submit_ceiling,
            since_submit,
            self.post_submit_ramp,
        )
    }

    /// Progress while the provider reports `translating`/`queued`.
    ///
    /// With an ETA hint the estimate approaches the polling ceiling as
    /// elapsed time dominates the remaining estimate; without one the caller
    /// holds the last value.
    pub fn polling(&self, elapsed: Duration, eta: Option<Duration>) -> Option<u8> {
        let eta = eta?;
        let floor = f64::from(self.post_submit_ceiling);
        let span = f64::from(self.polling_ceiling) - floor;
        let total = (elapsed + eta)
            .max(self.min_processing)
            .as_secs_f64();
        let estimate = floor + span * elapsed.as_secs_f64() / total;
        Some(estimate.clamp(floor, f64::from(self.polling_ceiling)) as u8)
    }

    /// Progress during the final fetch: polling ceiling up to 100, linear
    /// over `final_ramp`.
    pub fn finalizing(&self, since_done: Duration) -> u8 {
        ramp(self.polling_ceiling, 100, since_done, self.final_ramp)
    }

    /// How much longer a freshly-done job should be stretched before the
    /// final ramp starts. Zero once `min_processing` has passed.
    pub fn completion_hold(&self, elapsed: Duration) -> Duration {
        self.min_processing.saturating_sub(elapsed)
    }
}

/// Linear interpolation from `from` to `to` over `span`, saturating at `to`.
pub fn ramp(from: u8, to: u8, elapsed: Duration, span: Duration) -> u8 {
    if span.is_zero() || elapsed >= span {
        return to;
    }
    let fraction = elapsed.as_secs_f64() / span.as_secs_f64();
    let value = f64::from(from) + (f64::from(to) - f64::from(from)) * fraction;
    value as u8
}
