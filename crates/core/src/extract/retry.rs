use crate::llm::error::{error_kind, LlmErrorKind};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BACKOFF_STEP: Duration = Duration::from_secs(20);

type BackoffFn = dyn Fn(u32) -> Duration + Send + Sync;
type RetryableFn = dyn Fn(&anyhow::Error) -> bool + Send + Sync;

/// How many times to call, how long to wait before attempt `n + 1`, and which
/// failures are worth another try.
#[derive(Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    backoff: Arc<BackoffFn>,
    retryable: Arc<RetryableFn>,
}

impl RetryPolicy {
    pub fn new(
        max_attempts: u32,
        backoff: impl Fn(u32) -> Duration + Send + Sync + 'static,
        retryable: impl Fn(&anyhow::Error) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: Arc::new(backoff),
            retryable: Arc::new(retryable),
        }
    }

    /// Retries rate-limited generation calls with a linearly growing pause
    /// (`attempt * step`).
    pub fn rate_limited(max_attempts: u32, step: Duration) -> Self {
        Self::new(
            max_attempts,
            move |attempt| step * attempt,
            |err| error_kind(err) == LlmErrorKind::RateLimited,
        )
    }

    pub fn backoff(&self, attempt: u32) -> Duration {
        (self.backoff)(attempt)
    }

    /// Delay before the next attempt, or `None` when `err` after `attempt`
    /// (1-based) should be returned to the caller.
    pub fn next_delay(&self, attempt: u32, err: &anyhow::Error) -> Option<Duration> {
        if attempt >= self.max_attempts || !(self.retryable)(err) {
            return None;
        }
        Some(self.backoff(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::rate_limited(DEFAULT_MAX_ATTEMPTS, DEFAULT_BACKOFF_STEP)
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("first_backoff", &self.backoff(1))
            .finish()
    }
}

/// Runs `op` until it succeeds or the policy gives up. `op` receives the
/// 1-based attempt number.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> anyhow::Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => match policy.next_delay(attempt, &err) {
                Some(backoff) => {
                    tracing::warn!(attempt, ?backoff, error = %err, "call failed; retrying");
                    tokio::time::sleep(backoff).await;
                }
                None => return Err(err),
            },
        }
    }
}
