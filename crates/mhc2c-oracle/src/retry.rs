//! Retry with exponential backoff at the adapter boundary
//!
//! Only [`OracleError::Transient`] failures are retried. Once the attempt
//! budget is spent the last failure is reported as
//! [`OracleError::RetriesExhausted`], which the core treats like any other
//! oracle failure.

use crate::chat::ChatModel;
use async_trait::async_trait;
use mhc2c_core::{OracleError, ScoringOracle};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Attempt budget and backoff schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay after the first failure
    pub initial_backoff: Duration,
    /// Upper bound for any single delay
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 6,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(20),
        }
    }
}

impl RetryPolicy {
    /// Policy with `max_attempts` and default delays
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Single attempt, no retries
    #[must_use]
    pub fn none() -> Self {
        Self::new(1)
    }

    #[must_use]
    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self
    }

    /// Delay before attempt `attempt + 1`, where `attempt` starts at 1
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    /// Run `op` until it succeeds, fails permanently, or the budget is spent
    ///
    /// # Errors
    /// The first non-retryable error, or [`OracleError::RetriesExhausted`].
    pub async fn retry<T, F, Fut>(&self, operation: &str, op: F) -> Result<T, OracleError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, OracleError>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_retryable() => return Err(err),
                Err(err) if attempt >= self.max_attempts => {
                    return Err(OracleError::RetriesExhausted {
                        attempts: attempt,
                        last: err.to_string(),
                    });
                }
                Err(err) => {
                    let delay = self.backoff(attempt);
                    warn!(
                        operation,
                        attempt,
                        max_attempts = self.max_attempts,
                        backoff_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "Transient oracle failure, retrying"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
            }
        }
    }
}

/// Oracle wrapper applying a [`RetryPolicy`] to every call
#[derive(Debug, Clone)]
pub struct Retrying<T> {
    inner: T,
    policy: RetryPolicy,
}

impl<T> Retrying<T> {
    #[must_use]
    pub fn new(inner: T, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    #[must_use]
    pub fn inner(&self) -> &T {
        &self.inner
    }

    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl<M: ChatModel> ChatModel for Retrying<M> {
    async fn complete(&self, prompt: &str, system: Option<&str>) -> Result<String, OracleError> {
        self.policy
            .retry("complete", || self.inner.complete(prompt, system))
            .await
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}

#[async_trait]
impl<S: ScoringOracle> ScoringOracle for Retrying<S> {
    async fn score(&self, text: &str) -> Result<f64, OracleError> {
        self.policy.retry("score", || self.inner.score(text)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mhc2c_test_utils::{CallCounter, StubScorer};
    use pretty_assertions::assert_eq;

    fn fast(attempts: u32) -> RetryPolicy {
        RetryPolicy::new(attempts).with_backoff(Duration::ZERO, Duration::ZERO)
    }

    #[test]
    fn default_schedule_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 6);
        let delays: Vec<u64> = (1..=6).map(|a| policy.backoff(a).as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4, 8, 16, 20]);
    }

    #[test]
    fn zero_attempts_means_one() {
        assert_eq!(RetryPolicy::new(0).max_attempts, 1);
    }

    #[tokio::test]
    async fn transient_failures_are_retried_until_success() {
        let calls = CallCounter::default();
        let result = fast(5)
            .retry("op", || {
                let n = calls.bump();
                async move {
                    if n < 3 {
                        Err(OracleError::transient("busy"))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn permanent_failure_is_not_retried() {
        let calls = CallCounter::default();
        let result: Result<(), _> = fast(5)
            .retry("op", || {
                calls.bump();
                async { Err(OracleError::permanent("bad request")) }
            })
            .await;

        assert_eq!(result, Err(OracleError::permanent("bad request")));
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn exhaustion_reports_attempts() {
        let scorer = Retrying::new(
            StubScorer::new(|_| Err(OracleError::transient("503"))),
            fast(4),
        );

        let err = scorer.score("x").await.unwrap_err();

        assert_eq!(scorer.inner().calls.get(), 4);
        assert_eq!(
            err,
            OracleError::RetriesExhausted {
                attempts: 4,
                last: "transient oracle failure: 503".to_string()
            }
        );
    }
}
