use std::time::Duration;

use log::{debug, warn};
use tokio::time::sleep;

use crate::error::RpcError;

/// Configuration for retry behavior on idempotent RPC reads
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempt budget, including the first try
    pub max_attempts: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Cap on the backoff delay
    pub max_delay: Duration,
    /// Multiplier applied to the delay after each attempt
    pub backoff_multiplier: f64,
    /// Whether to add jitter to prevent thundering herd
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            backoff_multiplier: 2.0,
            jitter: false,
        }
    }
}

/// Retry wrapper with exponential backoff. Only transient errors are
/// retried; everything else propagates on the first failure. Applied
/// around the transport call so read operations stay pass-through.
pub struct RetryManager {
    config: RetryConfig,
    operation_name: String,
}

impl RetryManager {
    pub fn new(operation_name: &str, config: RetryConfig) -> Self {
        Self {
            config,
            operation_name: operation_name.to_string(),
        }
    }

    /// Execute an idempotent operation with retry logic.
    pub async fn execute<T, F, Fut>(&self, operation: F) -> Result<T, RpcError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, RpcError>>,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(result) => {
                    if attempt > 1 {
                        debug!("{} recovered on attempt {}", self.operation_name, attempt);
                    }
                    return Ok(result);
                }
                Err(error) => {
                    if !error.is_transient() {
                        return Err(error);
                    }
                    if attempt >= self.config.max_attempts {
                        warn!(
                            "{} failed after {} attempts: {}",
                            self.operation_name, attempt, error
                        );
                        return Err(error);
                    }

                    let delay = self.delay_for_attempt(attempt);
                    warn!(
                        "{} attempt {}/{} failed: {}, retrying in {:?}",
                        self.operation_name, attempt, self.config.max_attempts, error, delay
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Backoff delay after the given (1-based) attempt number.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.config.initial_delay.as_secs_f64();
        let exponential = base * self.config.backoff_multiplier.powi(attempt as i32 - 1);
        let capped = exponential.min(self.config.max_delay.as_secs_f64());

        let final_delay = if self.config.jitter {
            let jitter_factor = 0.1;
            let jitter = capped * jitter_factor * (rand::random::<f64>() - 0.5);
            (capped + jitter).max(0.0)
        } else {
            capped
        };

        Duration::from_secs_f64(final_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_config(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(10),
            backoff_multiplier: 2.0,
            jitter: false,
        }
    }

    #[test]
    fn test_default_config_matches_policy() {
        let config = RetryConfig::default();
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.initial_delay, Duration::from_secs(1));
        assert_eq!(config.backoff_multiplier, 2.0);
        assert!(!config.jitter);
    }

    #[test]
    fn test_delay_doubles_per_attempt() {
        let manager = RetryManager::new("test", RetryConfig::default());
        assert_eq!(manager.delay_for_attempt(1), Duration::from_secs(1));
        assert_eq!(manager.delay_for_attempt(2), Duration::from_secs(2));
        assert_eq!(manager.delay_for_attempt(3), Duration::from_secs(4));
        assert_eq!(manager.delay_for_attempt(4), Duration::from_secs(8));
        assert_eq!(manager.delay_for_attempt(5), Duration::from_secs(16));
    }

    #[test]
    fn test_delay_capped_at_max() {
        let config = RetryConfig {
            max_attempts: 10,
            initial_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(20),
            backoff_multiplier: 3.0,
            jitter: false,
        };
        let manager = RetryManager::new("test", config);
        // 5 * 3^4 = 405, capped at 20
        assert_eq!(manager.delay_for_attempt(5), Duration::from_secs(20));
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let manager = RetryManager::new("test", fast_config(3));
        let result = manager.execute(|| async { Ok::<i32, RpcError>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_non_transient_error_aborts_immediately() {
        let manager = RetryManager::new("test", fast_config(5));
        let calls = AtomicU32::new(0);
        let result = manager
            .execute(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<i32, RpcError>(RpcError::Decode("bad payload".to_string()))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transient_error_exhausts_attempt_budget() {
        let manager = RetryManager::new("test", fast_config(5));
        let calls = AtomicU32::new(0);
        let result = manager
            .execute(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<i32, RpcError>(RpcError::Timeout { seconds: 20 })
            })
            .await;
        assert!(matches!(result, Err(RpcError::Timeout { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let manager = RetryManager::new("test", fast_config(5));
        let calls = AtomicU32::new(0);
        let result = manager
            .execute(|| async {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(RpcError::Status(503))
                } else {
                    Ok(7u64)
                }
            })
            .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
