//! Exponential backoff shared by every remote call.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self { Self { max_attempts: 3, base_delay: Duration::from_secs(1) } }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self { Self { max_attempts: max_attempts.max(1), base_delay } }

    /// Delay slept after failed attempt `attempt` (1-based): `base * 2^attempt`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(1u32 << attempt.min(16))
    }
}

/// Runs `op` until it succeeds, returns an error `retryable` rejects, or the
/// attempt budget is spent. `op` receives the 1-based attempt number.
pub async fn with_backoff<T, E, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    retryable: impl Fn(&E) -> bool,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < attempts && retryable(&err) => {
                let delay = policy.delay_after(attempt);
                tracing::debug!(label, attempt, error = %err, delay_ms = delay.as_millis() as u64, "retrying remote call");
                if !delay.is_zero() { tokio::time::sleep(delay).await; }
                attempt += 1;
            }
            Err(err) => {
                tracing::warn!(label, attempt, error = %err, "remote call failed");
                return Err(err);
            }
        }
    }
}
