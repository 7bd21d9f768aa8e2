use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{warn, info, error};

use crate::models::{RiskScoreError, Result};

/// Retry configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
        }
    }
}

/// Retry with exponential backoff. Only transient errors are retried.
pub async fn retry_with_backoff<F, T, Fut>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    info!("Operation {} succeeded on attempt {}", operation_name, attempt);
                }
                return Ok(result);
            }
            Err(e) if e.is_transient() && attempt < max_attempts => {
                warn!("Operation {} failed on attempt {}: {}", operation_name, attempt, e);
                sleep(calculate_delay(config, attempt)).await;
                attempt += 1;
            }
            Err(e) => {
                if e.is_transient() {
                    error!("Operation {} failed after {} attempts: {}", operation_name, attempt, e);
                }
                return Err(e);
            }
        }
    }
}

/// Bound a single request; elapsed time becomes `RiskScoreError::Timeout`.
pub async fn with_timeout<T, Fut>(source_name: &str, limit: Duration, fut: Fut) -> Result<T>
where
    Fut: Future<Output = Result<T>>,
{
    match timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(RiskScoreError::Timeout {
            source_name: source_name.to_string(),
            seconds: limit.as_secs(),
        }),
    }
}

fn calculate_delay(config: &RetryConfig, attempt: u32) -> Duration {
    let delay_ms = config.base_delay.as_millis() as f64
        * config.backoff_multiplier.powi((attempt - 1) as i32);

    let delay = Duration::from_millis(delay_ms as u64);

    if delay > config.max_delay {
        config.max_delay
    } else {
        delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_config(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            base_delay: Duration::from_millis(1),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_retry_with_backoff() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = retry_with_backoff(&fast_config(3), "test_operation", || {
            let c = counter_clone.clone();
            async move {
                let count = c.fetch_add(1, Ordering::SeqCst);
                if count < 2 {
                    Err(RiskScoreError::Source {
                        source_name: "test".to_string(),
                        message: "Simulated failure".to_string(),
                    })
                } else {
                    Ok("Success")
                }
            }
        }).await;

        assert_eq!(result.unwrap(), "Success");
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_errors_are_not_retried() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result: Result<()> = retry_with_backoff(&fast_config(5), "invalid", || {
            let c = counter_clone.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(RiskScoreError::InvalidRecord {
                    wallet: "0x1".to_string(),
                    message: "bad".to_string(),
                })
            }
        }).await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_with_timeout_converts_elapsed() {
        let result: Result<()> = with_timeout("slow", Duration::from_millis(5), async {
            sleep(Duration::from_secs(5)).await;
            Ok(())
        }).await;

        assert!(matches!(result, Err(RiskScoreError::Timeout { .. })));
    }

    #[test]
    fn test_delay_is_capped() {
        let config = RetryConfig {
            max_attempts: 10,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(500),
            backoff_multiplier: 2.0,
        };
        assert_eq!(calculate_delay(&config, 1), Duration::from_millis(100));
        assert_eq!(calculate_delay(&config, 2), Duration::from_millis(200));
        assert_eq!(calculate_delay(&config, 8), Duration::from_millis(500));
    }
}
