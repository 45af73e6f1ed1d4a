//! Fixed-budget retry loop with linear backoff.
//!
//! Semantics:
//! - attempts run `1..=max_attempts`; a zero budget still makes one attempt
//! - after failed attempt `n` (when attempts remain) the loop waits `step × n`
//! - no wait follows the final attempt
//! - errors that cannot improve on retry end the loop at once
//! - cancelling the token aborts an attempt or a wait with [`HttpError::Cancelled`]

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::HttpError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff_step: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn linear(max_attempts: usize, backoff_step: Duration) -> Self {
        Self {
            max_attempts,
            backoff_step,
        }
    }

    /// Attempt budget, never below one.
    pub fn attempts(&self) -> usize {
        self.max_attempts.max(1)
    }

    /// Wait after failed attempt `attempt` (1-based).
    ///
    /// ```
    /// use daytext_http::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let p = RetryPolicy::default();
    /// assert_eq!(p.delay_for(1), Duration::from_secs(2));
    /// assert_eq!(p.delay_for(4), Duration::from_secs(8));
    /// ```
    pub fn delay_for(&self, attempt: usize) -> Duration {
        self.backoff_step
            .saturating_mul(u32::try_from(attempt).unwrap_or(u32::MAX))
    }
}

/// Hooks fired by [`retry`] so callers can report progress.
#[async_trait]
pub trait RetryObserver: Send {
    /// Attempt `attempt` failed with `err`.
    async fn on_failure(&mut self, _attempt: usize, _err: &HttpError) {}

    /// About to wait `wait` before the next attempt; `remaining` attempts are left.
    async fn on_backoff(&mut self, _attempt: usize, _wait: Duration, _remaining: usize) {}
}

/// Observer that ignores everything.
pub struct NoopObserver;

impl RetryObserver for NoopObserver {}

/// Run `op` until it succeeds, the budget is spent, or `cancel` fires.
pub async fn retry<T, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    observer: &mut dyn RetryObserver,
    mut op: F,
) -> Result<T, HttpError>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T, HttpError>>,
{
    let attempts = policy.attempts();
    let mut attempt = 0usize;

    loop {
        attempt += 1;
        if cancel.is_cancelled() {
            return Err(HttpError::Cancelled);
        }

        let err = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(HttpError::Cancelled),
            res = op(attempt) => match res {
                Ok(value) => {
                    tracing::debug!(attempt, "retry.succeeded");
                    return Ok(value);
                }
                Err(err) => err,
            },
        };

        tracing::warn!(attempt, max_attempts = attempts, error = %err, "retry.attempt_failed");
        observer.on_failure(attempt, &err).await;

        if !err.is_retryable() {
            return Err(err);
        }
        if attempt >= attempts {
            tracing::warn!(attempts = attempt, "retry.exhausted");
            return Err(HttpError::Exhausted {
                attempts: attempt,
                last: Box::new(err),
            });
        }

        let wait = policy.delay_for(attempt);
        let remaining = attempts - attempt;
        tracing::info!(
            attempt,
            remaining,
            backoff_ms = wait.as_millis() as u64,
            "retry.backing_off"
        );
        observer.on_backoff(attempt, wait, remaining).await;

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(HttpError::Cancelled),
            _ = sleep(wait) => {}
        }
    }
}
