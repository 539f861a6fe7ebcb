//! Fans one job out to every configured notifier.
//!
//! Notifiers run concurrently and independently: one channel exhausting
//! its retries doesn't block or fail the others.

use backup_core::Job;
use futures::future::join_all;

use crate::notifier::{Notifier, NotifyOutcome};

/// Result of notifying a single channel.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DispatchResult {
    pub channel: String,
    pub trigger: String,
    pub success: bool,
    /// The level's gate was off; no attempt was made.
    pub suppressed: bool,
    pub attempts: u32,
    pub error: Option<String>,
    pub duration_ms: u64,
}

/// A set of notifiers sharing one job outcome.
#[derive(Debug, Default, Clone)]
pub struct Dispatcher {
    notifiers: Vec<Notifier>,
}

impl Dispatcher {
    pub fn new(notifiers: Vec<Notifier>) -> Self {
        Self { notifiers }
    }

    /// Create an empty dispatcher.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn add(&mut self, notifier: Notifier) {
        self.notifiers.push(notifier);
    }

    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }

    /// Notify every channel about `job` finishing with its recorded exit
    /// status. Results come back in registration order.
    pub async fn dispatch(&self, job: &Job) -> Vec<DispatchResult> {
        if self.notifiers.is_empty() {
            tracing::debug!(trigger = %job.trigger, "No notification channels configured");
            return Vec::new();
        }

        join_all(self.notifiers.iter().map(|notifier| Self::run_one(notifier, job))).await
    }

    async fn run_one(notifier: &Notifier, job: &Job) -> DispatchResult {
        let start = std::time::Instant::now();
        let result = notifier.notify_job(job).await;
        let duration_ms = start.elapsed().as_millis() as u64;
        let channel = notifier.channel_name().to_string();

        let (success, suppressed, attempts, error) = match result {
            Ok(NotifyOutcome::Suppressed { .. }) => (true, true, 0, None),
            Ok(NotifyOutcome::Delivered { attempts, .. }) => {
                (true, false, attempts.len() as u32, None)
            }
            Err(e) => {
                tracing::warn!(
                    channel = %channel,
                    trigger = %job.trigger,
                    error = %e,
                    duration_ms,
                    "Notification delivery failed"
                );
                let attempts = match &e {
                    crate::NotifyError::Exhausted { attempts, .. }
                    | crate::NotifyError::Cancelled { attempts, .. } => *attempts,
                    _ => 0,
                };
                (false, false, attempts, Some(e.to_string()))
            }
        };

        DispatchResult {
            channel,
            trigger: job.trigger.clone(),
            success,
            suppressed,
            attempts,
            error,
            duration_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::{Gates, NotificationLevel};
    use crate::retry::RetryPolicy;
    use crate::traits::{Channel, NotifyError};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct MockChannel {
        name: String,
        gates: Gates,
        send_count: Arc<AtomicUsize>,
        should_fail: bool,
    }

    impl MockChannel {
        fn new(name: &str, should_fail: bool) -> (Self, Arc<AtomicUsize>) {
            let count = Arc::new(AtomicUsize::new(0));
            let channel = Self {
                name: name.to_string(),
                gates: Gates::default(),
                send_count: count.clone(),
                should_fail,
            };
            (channel, count)
        }
    }

    #[async_trait::async_trait]
    impl Channel for MockChannel {
        fn channel_name(&self) -> &str {
            &self.name
        }

        fn gates(&self) -> Gates {
            self.gates
        }

        fn retry_policy(&self) -> RetryPolicy {
            RetryPolicy::new(1, 0)
        }

        fn render(&self, job: &Job, level: NotificationLevel) -> Result<String, NotifyError> {
            Ok(format!("{} {}", job.trigger, level))
        }

        async fn send(&self, _payload: &str) -> Result<(), NotifyError> {
            self.send_count.fetch_add(1, Ordering::SeqCst);
            if self.should_fail {
                Err(NotifyError::Config("mock failure".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn job() -> Job {
        Job::new("nightly", "Nightly DB")
    }

    #[tokio::test]
    async fn dispatch_to_all_channels() {
        let (a, count_a) = MockChannel::new("a", false);
        let (b, count_b) = MockChannel::new("b", false);
        let dispatcher = Dispatcher::new(vec![Notifier::new(a), Notifier::new(b)]);

        let results = dispatcher.dispatch(&job()).await;
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.success && !r.suppressed));
        assert_eq!(results[0].channel, "a");
        assert_eq!(results[1].channel, "b");
        assert_eq!(count_a.load(Ordering::SeqCst), 1);
        assert_eq!(count_b.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn partial_failure_doesnt_block() {
        let (failing, fail_count) = MockChannel::new("fail", true);
        let (ok, ok_count) = MockChannel::new("ok", false);
        let mut dispatcher = Dispatcher::empty();
        dispatcher.add(Notifier::new(failing));
        dispatcher.add(Notifier::new(ok));

        let results = dispatcher.dispatch(&job().with_exit_status(2)).await;
        assert_eq!(results.len(), 2);
        assert!(!results[0].success);
        assert_eq!(results[0].attempts, 2);
        assert!(results[0].error.as_deref().unwrap().contains("fail Failed!"));
        assert!(results[1].success);
        assert_eq!(fail_count.load(Ordering::SeqCst), 2);
        assert_eq!(ok_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn suppressed_channel_reports_success_without_attempts() {
        let (mut quiet, count) = MockChannel::new("quiet", false);
        quiet.gates.on_warning = false;
        let dispatcher = Dispatcher::new(vec![Notifier::new(quiet)]);

        let results = dispatcher.dispatch(&job().with_exit_status(1)).await;
        assert!(results[0].success);
        assert!(results[0].suppressed);
        assert_eq!(results[0].attempts, 0);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_dispatcher_returns_empty() {
        let dispatcher = Dispatcher::empty();
        assert!(dispatcher.is_empty());
        assert!(dispatcher.dispatch(&job()).await.is_empty());
    }
}
