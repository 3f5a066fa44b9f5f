use std::time::{Duration, Instant};

use async_trait::async_trait;

/// Time source for the job runner.
///
/// Progress ramps and the polling loop measure elapsed time and sleep
/// between steps; routing both through this trait lets tests advance time
/// virtually instead of waiting out real delays.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Monotonic reading since an arbitrary fixed origin.
    fn monotonic(&self) -> Duration;

    async fn sleep(&self, duration: Duration);
}

/// Production clock: `Instant` readings and real `tokio::time` sleeps.
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for SystemClock {
    fn monotonic(&self) -> Duration {
        self.origin.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
