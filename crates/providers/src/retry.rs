//! Provider retry — bounded re-attempts with exponential backoff.
//!
//! When a call fails with a retryable error (network, timeout, rate limit,
//! 5xx), the same request is sent again after `base_delay * 2^attempt`.
//! Authentication and other client errors fail immediately.

use async_trait::async_trait;
use promptlab_core::error::ProviderError;
use promptlab_core::provider::*;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// How many times to try and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Never less than 1.
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Build from the `[retry]` config section.
    pub fn from_config(config: &promptlab_config::RetryConfig) -> Self {
        Self::new(config.max_attempts, Duration::from_millis(config.base_delay_ms))
    }

    /// Pause after the 1-based `attempt` failed: `base_delay * 2^attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(1000))
    }
}

/// A provider that re-sends failed requests to the wrapped provider.
pub struct RetryProvider {
    inner: Arc<dyn Provider>,
    policy: RetryPolicy,
}

impl RetryProvider {
    pub fn new(inner: Arc<dyn Provider>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }
}

#[async_trait]
impl Provider for RetryProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let max = self.policy.max_attempts;
        let mut attempt = 1;

        loop {
            match self.inner.complete(request.clone()).await {
                Ok(response) => {
                    if attempt > 1 {
                        debug!(provider = %self.inner.name(), attempt, "Retry succeeded");
                    }
                    return Ok(response);
                }
                Err(e) if !e.is_retryable() => {
                    warn!(provider = %self.inner.name(), error = %e, "Non-retryable provider error");
                    return Err(e);
                }
                Err(e) => {
                    warn!(
                        provider = %self.inner.name(),
                        attempt,
                        max_attempts = max,
                        error = %e,
                        "Attempt failed"
                    );
                    if attempt >= max {
                        return Err(e);
                    }
                    tokio::time::sleep(self.policy.delay_for(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        self.inner.health_check().await
    }
}
