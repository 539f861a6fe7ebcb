//! Fixed-interval retry around a single delivery attempt.
//!
//! The wait between attempts is constant: no backoff growth, no jitter.
//! Total wall-clock time is bounded by `max_retries * retry_wait` plus the
//! attempts themselves.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use crate::traits::{AttemptOutcome, DeliveryAttempt, NotifyError};

/// How many times to retry and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first.
    pub max_retries: u32,
    pub retry_wait: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, retry_waitsec: u64) -> Self {
        Self {
            max_retries,
            retry_wait: Duration::from_secs(retry_waitsec),
        }
    }

    /// A single attempt, never retried.
    pub fn once() -> Self {
        Self::new(0, 0)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Drives attempts for one `notify` call.
///
/// Attempts run strictly one after another. The wait between them is a
/// tokio sleep raced against `cancel`, so cancellation ends the loop
/// without another attempt.
pub struct RetryingDispatcher<'a> {
    channel: &'a str,
    policy: RetryPolicy,
    cancel: &'a CancellationToken,
}

impl<'a> RetryingDispatcher<'a> {
    pub fn new(channel: &'a str, policy: RetryPolicy, cancel: &'a CancellationToken) -> Self {
        Self {
            channel,
            policy,
            cancel,
        }
    }

    /// Run `attempt_fn` until it succeeds or the policy is used up.
    ///
    /// `attempt_fn` receives the 1-based attempt index and must perform
    /// exactly one delivery of `payload`. On success every attempt made is
    /// returned, the last one being the success.
    pub async fn execute<F, Fut>(
        &self,
        payload: &str,
        mut attempt_fn: F,
    ) -> Result<Vec<DeliveryAttempt>, NotifyError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<(), NotifyError>>,
    {
        let mut attempts = Vec::with_capacity(1);
        let mut attempt: u32 = 0;

        loop {
            if self.cancel.is_cancelled() {
                return Err(self.cancelled(attempt));
            }

            attempt += 1;
            let started_at = chrono::Utc::now();
            let start = Instant::now();
            let result = attempt_fn(attempt).await;
            let elapsed = start.elapsed();

            let err = match result {
                Ok(()) => {
                    attempts.push(DeliveryAttempt {
                        attempt,
                        payload: payload.to_string(),
                        started_at,
                        elapsed,
                        outcome: AttemptOutcome::Succeeded,
                    });
                    return Ok(attempts);
                }
                Err(e) => e,
            };

            attempts.push(DeliveryAttempt {
                attempt,
                payload: payload.to_string(),
                started_at,
                elapsed,
                outcome: AttemptOutcome::Failed {
                    cause: err.to_string(),
                },
            });

            let retries_used = attempt - 1;
            if retries_used >= self.policy.max_retries {
                error!(
                    channel = self.channel,
                    attempts = attempt,
                    error = %err,
                    "Notification retries exhausted"
                );
                return Err(NotifyError::Exhausted {
                    channel: self.channel.to_string(),
                    attempts: attempt,
                    last: Box::new(err),
                });
            }

            warn!(
                channel = self.channel,
                error = %err,
                wait_secs = self.policy.retry_wait.as_secs(),
                "Retry #{} of {}",
                retries_used + 1,
                self.policy.max_retries
            );

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    warn!(channel = self.channel, attempts = attempt, "Retry wait cancelled");
                    return Err(self.cancelled(attempt));
                }
                _ = tokio::time::sleep(self.policy.retry_wait) => {}
            }
        }
    }

    fn cancelled(&self, attempts: u32) -> NotifyError {
        NotifyError::Cancelled {
            channel: self.channel.to_string(),
            attempts,
        }
    }
}
