use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// How often, and how patiently, a failed tagger call is attempted again.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: usize,
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: usize, initial_backoff_ms: u64, max_backoff_ms: u64) -> Self {
        Self {
            max_retries,
            initial_backoff: Duration::from_millis(initial_backoff_ms),
            max_backoff: Duration::from_millis(max_backoff_ms),
        }
    }

    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self::new(0, 0, 0)
    }

    pub fn max_retries(&self) -> usize {
        self.max_retries
    }

    /// Delay before retry number `retry` (1-based), doubling up to the cap.
    pub fn backoff(&self, retry: usize) -> Duration {
        let shift = retry.saturating_sub(1).min(31) as u32;
        self.initial_backoff
            .saturating_mul(1u32 << shift)
            .min(self.max_backoff)
    }

    /// Run `op`, retrying every error.
    pub async fn retry<F, Fut, T, E>(&self, op_name: &str, op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        self.retry_if(op_name, op, |_| true).await
    }

    /// Run `op`, retrying only errors `retryable` accepts. Any other error is
    /// returned at once.
    pub async fn retry_if<F, Fut, T, E, P>(
        &self,
        op_name: &str,
        mut op: F,
        retryable: P,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
        P: Fn(&E) -> bool,
    {
        let mut retries = 0;
        loop {
            let err = match op().await {
                Ok(value) => {
                    if retries > 0 {
                        info!(operation = op_name, retries, "Recovered after retrying");
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            if !retryable(&err) {
                warn!(operation = op_name, error = %err, "Permanent failure, not retrying");
                return Err(err);
            }
            if retries == self.max_retries {
                warn!(operation = op_name, attempts = retries + 1, error = %err, "Giving up");
                return Err(err);
            }

            retries += 1;
            let delay = self.backoff(retries);
            warn!(
                operation = op_name,
                retry = retries,
                max_retries = self.max_retries,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Transient failure, retrying"
            );
            sleep(delay).await;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, 200, 5_000)
    }
}
