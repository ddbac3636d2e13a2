use std::{fmt, future::Future, sync::Arc, time::Duration};

use futures::{FutureExt, future::BoxFuture};
use rand::Rng;

use crate::error::Result;

/// Sleeps for the given duration. Swappable so tests never wait on real time.
pub type DelayFn = Arc<dyn Fn(Duration) -> BoxFuture<'static, ()> + Send + Sync>;

/// Bounded retry with linearly increasing backoff.
///
/// Attempt `n` (zero based) waits `base_delay * (n + 1)` plus up to `jitter`
/// before the next try. Only errors for which [`crate::Error::is_transient`]
/// holds are retried; anything else is returned immediately.
#[derive(Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub jitter: Duration,
    delay: DelayFn,
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("jitter", &self.jitter)
            .finish_non_exhaustive()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2, Duration::from_millis(400))
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            jitter: base_delay / 4,
            delay: Arc::new(|wait| tokio::time::sleep(wait).boxed()),
        }
    }

    /// A policy that fails on the first error.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn with_delay_fn<F, Fut>(mut self, delay: F) -> Self
    where
        F: Fn(Duration) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.delay = Arc::new(move |wait| delay(wait).boxed());
        self
    }

    pub fn backoff(&self, attempt: u32) -> Duration {
        let linear = self.base_delay * (attempt + 1);
        let jitter_ms = self.jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return linear;
        }
        linear + Duration::from_millis(rand::rng().random_range(0..=jitter_ms))
    }

    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < self.max_retries => {
                    let wait = self.backoff(attempt);
                    tracing::warn!(
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        wait_ms = wait.as_millis() as u64,
                        error = %err,
                        "retrying upstream call"
                    );
                    (self.delay)(wait).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
