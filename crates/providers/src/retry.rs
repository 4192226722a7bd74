//! Retrying provider: re-sends a request after transient failures.
//!
//! Rate limits, timeouts, network errors and 5xx responses are retried up
//! to `max_retries` times. Each attempt runs under its own timeout, and
//! failed attempts back off exponentially up to 60s. A provider's longer
//! `retry_after` is waited out in full.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use trialmind_core::error::ProviderError;
use trialmind_core::provider::*;

/// Longest self-chosen wait between two attempts.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

pub struct RetryProvider {
    inner: Arc<dyn Provider>,
    max_retries: u32,
    timeout: Duration,
    base_delay: Duration,
}

impl RetryProvider {
    pub fn new(inner: Arc<dyn Provider>, max_retries: u32, timeout: Duration) -> Self {
        Self {
            inner,
            max_retries,
            timeout,
            base_delay: Duration::from_millis(500),
        }
    }

    /// Set the delay before the first retry; later retries double it.
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    fn backoff(&self, attempt: u32, error: &ProviderError) -> Duration {
        let exponential = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(MAX_BACKOFF);
        match error {
            // The server's own wait wins, even past the cap.
            ProviderError::RateLimited { retry_after_secs } => {
                exponential.max(Duration::from_secs(*retry_after_secs))
            }
            _ => exponential,
        }
    }
}

/// Whether a failed call may succeed if sent again.
pub fn is_transient(error: &ProviderError) -> bool {
    match error {
        ProviderError::RateLimited { .. } | ProviderError::Timeout(_) | ProviderError::Network(_) => {
            true
        }
        ProviderError::ApiError { status_code, .. } => *status_code >= 500,
        ProviderError::AuthenticationFailed(_) | ProviderError::ModelNotFound(_) => false,
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
        let mut attempt = 0;
        loop {
            let error = match tokio::time::timeout(self.timeout, self.inner.complete(request.clone()))
                .await
            {
                Ok(Ok(response)) => return Ok(response),
                Ok(Err(e)) => e,
                Err(_) => ProviderError::Timeout(format!(
                    "Provider '{}' timed out after {}s",
                    self.inner.name(),
                    self.timeout.as_secs()
                )),
            };

            if attempt >= self.max_retries || !is_transient(&error) {
                return Err(error);
            }

            let delay = self.backoff(attempt, &error);
            warn!(
                provider = %self.inner.name(),
                attempt = attempt + 1,
                max_retries = self.max_retries,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "LLM call failed, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        self.inner.health_check().await
    }
}
