//! Provider retry — bounded retry with exponential backoff and a per-attempt
//! timeout around a single provider.
//!
//! With `max_attempts = 1` the wrapper only adds the timeout: a failed call is
//! surfaced to the caller unchanged.

use salespulse_config::RetryConfig;
use salespulse_core::error::ProviderError;
use salespulse_core::provider::*;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// A provider that retries transient failures of an inner provider.
pub struct RetryProvider {
    inner: Arc<dyn salespulse_core::Provider>,
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    timeout: Duration,
}

impl RetryProvider {
    /// Wrap `inner` with a single attempt and the default 120s timeout.
    pub fn new(inner: Arc<dyn salespulse_core::Provider>) -> Self {
        Self {
            inner,
            max_attempts: 1,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            timeout: Duration::from_secs(120),
        }
    }

    /// Wrap `inner` with the policy from configuration.
    pub fn from_config(inner: Arc<dyn salespulse_core::Provider>, config: &RetryConfig) -> Self {
        Self::new(inner)
            .with_max_attempts(config.max_attempts)
            .with_backoff(
                Duration::from_millis(config.base_delay_ms),
                Duration::from_millis(config.max_delay_ms),
            )
            .with_timeout(Duration::from_secs(config.timeout_secs))
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_backoff(mut self, base: Duration, max: Duration) -> Self {
        self.base_delay = base;
        self.max_delay = max.max(base);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Delay before retry number `retry` (1-based): `base * 2^(retry-1)`,
    /// capped at `max_delay`, and never shorter than a provider's
    /// `retry_after` hint.
    fn backoff(&self, retry: u32, error: &ProviderError) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        let delay = self
            .base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay);
        match error {
            ProviderError::RateLimited { retry_after_secs } => {
                delay.max(Duration::from_secs(*retry_after_secs).min(self.max_delay))
            }
            _ => delay,
        }
    }
}

#[async_trait]
impl salespulse_core::Provider for RetryProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let provider_name = self.inner.name().to_string();
        let mut attempt = 1;

        loop {
            let error =
                match tokio::time::timeout(self.timeout, self.inner.complete(request.clone()))
                    .await
                {
                    Ok(Ok(response)) => return Ok(response),
                    Ok(Err(e)) => e,
                    Err(_) => ProviderError::Timeout(format!(
                        "Provider '{}' timed out after {}s",
                        provider_name,
                        self.timeout.as_secs()
                    )),
                };

            if attempt >= self.max_attempts || !error.is_transient() {
                warn!(
                    provider = %provider_name,
                    attempt,
                    error = %error,
                    "Provider call failed, giving up"
                );
                return Err(error);
            }

            let delay = self.backoff(attempt, &error);
            info!(
                provider = %provider_name,
                attempt,
                max_attempts = self.max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Retrying provider call"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        self.inner.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use salespulse_core::Provider;
    use salespulse_core::message::Message;
    use std::sync::Mutex;

    /// Fails with the queued errors first, then succeeds.
    struct FlakyProvider {
        failures: Mutex<Vec<ProviderError>>,
        call_count: Mutex<usize>,
    }

    impl FlakyProvider {
        fn new(failures: Vec<ProviderError>) -> Self {
            Self {
                failures: Mutex::new(failures),
                call_count: Mutex::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.call_count.lock().unwrap()
        }
    }

    #[async_trait]
    impl salespulse_core::Provider for FlakyProvider {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> std::result::Result<ProviderResponse, ProviderError> {
            *self.call_count.lock().unwrap() += 1;
            let mut failures = self.failures.lock().unwrap();
            if !failures.is_empty() {
                return Err(failures.remove(0));
            }
            Ok(ProviderResponse {
                message: Message::assistant("success"),
                usage: None,
                model: "test-model".into(),
            })
        }
    }

    /// A mock provider that hangs forever (for timeout testing).
    struct HangingProvider;

    #[async_trait]
    impl salespulse_core::Provider for HangingProvider {
        fn name(&self) -> &str {
            "hanging"
        }

        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> std::result::Result<ProviderResponse, ProviderError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            unreachable!()
        }

        async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
            Ok(false)
        }
    }

    fn test_request() -> ProviderRequest {
        ProviderRequest::prompt("test", "hello")
    }

    fn quick(inner: Arc<dyn salespulse_core::Provider>, attempts: u32) -> RetryProvider {
        RetryProvider::new(inner)
            .with_max_attempts(attempts)
            .with_backoff(Duration::from_millis(1), Duration::from_millis(5))
    }

    #[tokio::test]
    async fn single_attempt_surfaces_first_error() {
        let inner = Arc::new(FlakyProvider::new(vec![ProviderError::Network(
            "conn refused".into(),
        )]));
        let retry = quick(inner.clone(), 1);

        let result = retry.complete(test_request()).await;
        assert!(matches!(result, Err(ProviderError::Network(_))));
        assert_eq!(inner.calls(), 1);
    }

    #[tokio::test]
    async fn transient_errors_are_retried() {
        let inner = Arc::new(FlakyProvider::new(vec![
            ProviderError::Network("reset".into()),
            ProviderError::ApiError {
                status_code: 503,
                message: "unavailable".into(),
            },
        ]));
        let retry = quick(inner.clone(), 3);

        let result = retry.complete(test_request()).await.unwrap();
        assert_eq!(result.message.content, "success");
        assert_eq!(inner.calls(), 3);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let inner = Arc::new(FlakyProvider::new(vec![
            ProviderError::AuthenticationFailed("bad key".into()),
        ]));
        let retry = quick(inner.clone(), 5);

        let result = retry.complete(test_request()).await;
        assert!(matches!(result, Err(ProviderError::AuthenticationFailed(_))));
        assert_eq!(inner.calls(), 1);
    }

    #[tokio::test]
    async fn attempts_are_bounded() {
        let inner = Arc::new(FlakyProvider::new(vec![
            ProviderError::Network("a".into()),
            ProviderError::Network("b".into()),
            ProviderError::Network("c".into()),
        ]));
        let retry = quick(inner.clone(), 2);

        let result = retry.complete(test_request()).await;
        match result {
            Err(ProviderError::Network(msg)) => assert_eq!(msg, "b"),
            other => panic!("Expected second network error, got: {other:?}"),
        }
        assert_eq!(inner.calls(), 2);
    }

    #[tokio::test]
    async fn timeout_becomes_timeout_error() {
        let retry = RetryProvider::new(Arc::new(HangingProvider))
            .with_timeout(Duration::from_millis(20));

        let result = retry.complete(test_request()).await;
        assert!(matches!(result, Err(ProviderError::Timeout(_))));
    }

    #[test]
    fn backoff_grows_and_caps() {
        let retry = RetryProvider::new(Arc::new(HangingProvider))
            .with_backoff(Duration::from_millis(100), Duration::from_millis(350));
        let err = ProviderError::Network("x".into());
        assert_eq!(retry.backoff(1, &err), Duration::from_millis(100));
        assert_eq!(retry.backoff(2, &err), Duration::from_millis(200));
        assert_eq!(retry.backoff(3, &err), Duration::from_millis(350));
    }

    #[test]
    fn backoff_honours_retry_after_up_to_cap() {
        let retry = RetryProvider::new(Arc::new(HangingProvider))
            .with_backoff(Duration::from_millis(100), Duration::from_secs(2));
        let err = ProviderError::RateLimited {
            retry_after_secs: 1,
        };
        assert_eq!(retry.backoff(1, &err), Duration::from_secs(1));
        let err = ProviderError::RateLimited {
            retry_after_secs: 60,
        };
        assert_eq!(retry.backoff(1, &err), Duration::from_secs(2));
    }

    #[test]
    fn from_config_applies_policy() {
        let config = RetryConfig {
            max_attempts: 3,
            base_delay_ms: 10,
            max_delay_ms: 40,
            timeout_secs: 7,
        };
        let retry = RetryProvider::from_config(Arc::new(HangingProvider), &config);
        assert_eq!(retry.max_attempts, 3);
        assert_eq!(retry.timeout, Duration::from_secs(7));
        assert_eq!(retry.name(), "hanging");
    }

    #[tokio::test]
    async fn health_check_reaches_inner_provider() {
        let retry = quick(Arc::new(HangingProvider), 3);
        assert!(!retry.health_check().await.unwrap());
    }
}
