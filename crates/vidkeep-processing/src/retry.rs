//! Bounded exponential-backoff retry for transient failures.

use std::future::Future;
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use tokio_util::sync::CancellationToken;
use vidkeep_core::Config;

/// Configuration for retry with exponential backoff
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Initial backoff duration
    pub initial_interval: Duration,
    /// Maximum backoff duration
    pub max_interval: Duration,
    /// Multiplier for exponential backoff
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_interval: Duration::from_millis(200),
            max_interval: Duration::from_secs(5),
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.upload_max_attempts(),
            initial_interval: config.upload_retry_initial_interval(),
            max_interval: config.upload_retry_max_interval(),
            ..Default::default()
        }
    }

    /// Create an ExponentialBackoff from this config
    pub fn to_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            current_interval: self.initial_interval,
            initial_interval: self.initial_interval,
            max_interval: self.max_interval,
            multiplier: self.multiplier,
            // Attempts bound the loop, not wall time
            max_elapsed_time: None,
            ..Default::default()
        }
    }
}

#[derive(Debug)]
pub enum RetryError<E> {
    /// The last error seen, after giving up or on a permanent failure
    Failed(E),
    Cancelled,
}

/// Execute an async operation, retrying failures for which `is_transient` holds.
///
/// Each attempt and each backoff sleep is raced against `cancel`.
pub async fn retry_async<T, E, Fut, F, P>(
    operation: F,
    is_transient: P,
    config: &RetryConfig,
    operation_name: &str,
    cancel: &CancellationToken,
) -> Result<T, RetryError<E>>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let mut attempts = 0;
    let mut backoff = config.to_backoff();

    loop {
        attempts += 1;
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(RetryError::Cancelled),
            result = operation() => result,
        };

        let e = match result {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        if !is_transient(&e) {
            tracing::warn!(
                operation = %operation_name,
                attempt = attempts,
                error = %e,
                "Operation failed permanently"
            );
            return Err(RetryError::Failed(e));
        }

        if attempts >= config.max_attempts {
            tracing::warn!(
                operation = %operation_name,
                attempts = attempts,
                error = %e,
                "Operation failed after max retries"
            );
            return Err(RetryError::Failed(e));
        }

        let Some(duration) = backoff.next_backoff() else {
            return Err(RetryError::Failed(e));
        };

        tracing::warn!(
            operation = %operation_name,
            attempt = attempts,
            error = %e,
            retry_in_ms = duration.as_millis() as u64,
            "Operation failed, retrying"
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(RetryError::Cancelled),
            _ = tokio::time::sleep(duration) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_config(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            initial_interval: Duration::from_millis(1),
            max_interval: Duration::from_millis(5),
            multiplier: 2.0,
        }
    }

    #[tokio::test]
    async fn test_transient_failure_then_success() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, RetryError<String>> = retry_async(
            || async {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(format!("attempt {} failed", n))
                } else {
                    Ok(n)
                }
            },
            |_| true,
            &fast_config(3),
            "test",
            &CancellationToken::new(),
        )
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), RetryError<String>> = retry_async(
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("still down".to_string())
            },
            |_| true,
            &fast_config(4),
            "test",
            &CancellationToken::new(),
        )
        .await;

        assert!(matches!(result, Err(RetryError::Failed(e)) if e == "still down"));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_permanent_failure_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), RetryError<String>> = retry_async(
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("bad key".to_string())
            },
            |_| false,
            &fast_config(5),
            "test",
            &CancellationToken::new(),
        )
        .await;

        assert!(matches!(result, Err(RetryError::Failed(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancelled_token_stops_before_first_attempt() {
        let calls = AtomicU32::new(0);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result: Result<(), RetryError<String>> = retry_async(
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
            |_| true,
            &fast_config(3),
            "test",
            &cancel,
        )
        .await;

        assert!(matches!(result, Err(RetryError::Cancelled)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_backoff_starts_at_initial_interval() {
        let config = RetryConfig {
            initial_interval: Duration::from_millis(100),
            ..fast_config(3)
        };
        let mut backoff = config.to_backoff();
        let first = backoff.next_backoff().unwrap();
        // default randomization factor is 0.5
        assert!(first >= Duration::from_millis(50) && first <= Duration::from_millis(150));
    }
}
