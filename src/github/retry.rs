//! Backoff for transient GitHub failures.
//!
//! Only errors classified [`GitHubErrorKind::Transient`] are retried; every
//! other error is returned from the first attempt. Nothing above the GitHub
//! layer retries: the resolver and the pipeline see either a response or a
//! final error.
//!
//! - [`RetryConfig::DEFAULT`]: 3 retries after 1s, 2s and 4s (about 7s of
//!   waiting in the worst case). Used for every idempotent effect.
//! - [`RetryConfig::NONE`]: a single attempt. Used for effects that must not
//!   be repeated, such as creating a ruleset.
//!
//! A sync holds the worker for the whole backoff, so delays stay short: a
//! delivery that keeps failing is better redelivered than waited on.

use std::future::Future;
use std::time::Duration;

use super::error::{GitHubApiError, GitHubErrorKind};

/// How often and how long to back off.
///
/// The delay before retry `n` is `initial_delay * 2^n`, capped at
/// `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Retries after the first attempt. Zero means a single attempt.
    pub max_retries: u32,

    /// Delay before the first retry.
    pub initial_delay: Duration,

    /// Upper bound on any single delay.
    pub max_delay: Duration,
}

impl RetryConfig {
    /// 3 retries after 1s, 2s and 4s.
    pub const DEFAULT: Self = Self {
        max_retries: 3,
        initial_delay: Duration::from_secs(1),
        max_delay: Duration::from_secs(8),
    };

    /// A single attempt.
    pub const NONE: Self = Self {
        max_retries: 0,
        initial_delay: Duration::ZERO,
        max_delay: Duration::ZERO,
    };

    /// Delay before retry number `retry` (0-indexed).
    ///
    /// Saturates instead of overflowing, so any `retry` is safe to ask for.
    pub fn delay(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry);
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Runs `operation`, retrying transient failures per `config`.
///
/// `operation` is called once per attempt and must build a fresh future each
/// time. Returns the first success, the first permanent error, or the last
/// transient error once `config.max_retries` retries are used up.
///
/// ```ignore
/// let response = retry_with_backoff(RetryConfig::DEFAULT, || {
///     execute_effect(client, effect.clone())
/// })
/// .await?;
/// ```
pub async fn retry_with_backoff<T, F, Fut>(
    config: RetryConfig,
    mut operation: F,
) -> Result<T, GitHubApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GitHubApiError>>,
{
    let mut retry = 0;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        if err.kind == GitHubErrorKind::Permanent {
            return Err(err);
        }
        if retry >= config.max_retries {
            if config.max_retries > 0 {
                tracing::warn!(attempts = retry + 1, error = %err, "GitHub call still failing, giving up");
            }
            return Err(err);
        }

        let delay = config.delay(retry);
        tracing::debug!(retry, ?delay, error = %err, "Transient GitHub failure, backing off");
        tokio::time::sleep(delay).await;
        retry += 1;
    }
}
