//! Bounded exponential backoff for network-facing collaborators.

use std::future::Future;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use tracing::warn;

use crate::config::RetryConfig;
use crate::constants::retry as defaults;
use crate::types::{Result, ReviveError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one
    pub max_retries: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.base_delay)
            .with_max_delay(self.max_delay)
            .with_factor(defaults::BACKOFF_FACTOR)
            .with_max_times(self.max_retries)
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// policy is exhausted. The last error is returned as-is.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, operation: &str, op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    op.retry(policy.backoff())
        .sleep(tokio::time::sleep)
        .when(ReviveError::is_retryable)
        .notify(|err: &ReviveError, delay: Duration| {
            warn!(
                operation,
                error = %err,
                delay_ms = delay.as_millis() as u64,
                "Retrying after failure"
            );
        })
        .await
}
