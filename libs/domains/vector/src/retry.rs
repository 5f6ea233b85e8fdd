use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::VectorResult;

/// Backoff schedule for waiting on a dependency
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Attempts after the first one
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// 1.0 keeps the delay fixed
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    /// Fixed delay between attempts.
    pub fn fixed(max_retries: u32, delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay: delay,
            max_delay: delay,
            backoff_multiplier: 1.0,
        }
    }

    pub fn with_backoff(mut self, multiplier: f64, max_delay: Duration) -> Self {
        self.backoff_multiplier = multiplier;
        self.max_delay = max_delay;
        self
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
        }
    }
}

/// Retry `operation` while it fails with a retryable error.
///
/// Non-retryable errors are returned immediately.
pub async fn retry_with_backoff<F, Fut, T>(
    what: &str,
    mut operation: F,
    config: &RetryConfig,
) -> VectorResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = VectorResult<T>>,
{
    let mut attempt = 0;
    let mut delay = config.initial_delay;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    debug!(what, attempt, "Succeeded after retries");
                }
                return Ok(result);
            }
            Err(e) if !e.kind().is_retryable() => return Err(e),
            Err(e) => {
                attempt += 1;

                if attempt > config.max_retries {
                    warn!(what, attempts = attempt, error = %e, "Giving up");
                    return Err(e);
                }

                debug!(
                    what,
                    attempt,
                    max = config.max_retries,
                    error = %e,
                    "Not ready, retrying in {:?}",
                    delay
                );

                tokio::time::sleep(delay).await;
                delay = delay.mul_f64(config.backoff_multiplier).min(config.max_delay);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VectorError;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_available() {
        let calls = AtomicU32::new(0);
        let config = RetryConfig::fixed(5, Duration::from_secs(1));

        let result = retry_with_backoff(
            "store",
            || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(VectorError::store_unavailable("health", None, "refused"))
                } else {
                    Ok(7)
                }
            },
            &config,
        )
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let config = RetryConfig::fixed(2, Duration::from_millis(10));

        let result: VectorResult<()> = retry_with_backoff(
            "store",
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(VectorError::store_unavailable("health", None, "refused"))
            },
            &config,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_error_returns_immediately() {
        let calls = AtomicU32::new(0);
        let result: VectorResult<()> = retry_with_backoff(
            "store",
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(VectorError::InvalidRequest("bad".into()))
            },
            &RetryConfig::default(),
        )
        .await;

        assert!(matches!(result, Err(VectorError::InvalidRequest(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
