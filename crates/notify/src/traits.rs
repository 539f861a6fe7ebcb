//! Channel capability trait, delivery records and shared error types.

use std::time::Duration;

use backup_core::{CoreError, Job};

use crate::level::{Gates, NotificationLevel};
use crate::retry::RetryPolicy;

/// Errors that can occur while configuring or running a notifier.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Template rendering failed: {0}")]
    Template(String),

    #[error("command `{command}` exited with {}: {stderr}", exit_label(.status))]
    CommandFailed {
        command: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{channel} Failed! gave up after {attempts} attempt(s): {last}")]
    Exhausted {
        channel: String,
        attempts: u32,
        last: Box<NotifyError>,
    },

    #[error("{channel} cancelled after {attempts} attempt(s)")]
    Cancelled { channel: String, attempts: u32 },

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl NotifyError {
    /// True for the states that end a `notify` call: retries exhausted or
    /// the call was cancelled.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Exhausted { .. } | Self::Cancelled { .. })
    }
}

fn exit_label(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("status {code}"),
        None => "signal".to_string(),
    }
}

/// Result of a single delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Succeeded,
    Failed { cause: String },
}

/// One try at delivering a payload. Never persisted.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DeliveryAttempt {
    /// 1-based attempt index.
    pub attempt: u32,
    /// Exactly what was handed to the delivery mechanism.
    pub payload: String,
    pub started_at: chrono::DateTime<chrono::Utc>,
    #[serde(with = "duration_ms")]
    pub elapsed: Duration,
    pub outcome: AttemptOutcome,
}

impl DeliveryAttempt {
    pub fn succeeded(&self) -> bool {
        self.outcome == AttemptOutcome::Succeeded
    }
}

mod duration_ms {
    use std::time::Duration;

    pub fn serialize<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }
}

/// A concrete notification channel.
///
/// The [`Notifier`](crate::Notifier) owns classification, gating and retry;
/// a channel only knows how to render its payload and push it out once.
///
/// `render` + `send` is the capability the notifier drives: it renders once
/// per `notify` call and retries `send` with the same payload, so every
/// recorded attempt carries exactly what was sent. `deliver_once` composes
/// the two for callers that want a single unretried delivery.
#[async_trait::async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable name for this channel (e.g., "zabbix").
    fn channel_name(&self) -> &str;

    /// Per-level opt-outs.
    fn gates(&self) -> Gates;

    fn retry_policy(&self) -> RetryPolicy;

    /// Render the payload one delivery sends for `job` at `level`.
    fn render(&self, job: &Job, level: NotificationLevel) -> Result<String, NotifyError>;

    /// Push an already-rendered payload out once. Any error is retryable.
    async fn send(&self, payload: &str) -> Result<(), NotifyError>;

    /// Render and send: exactly one delivery, no retry.
    async fn deliver_once(&self, job: &Job, level: NotificationLevel) -> Result<(), NotifyError> {
        let payload = self.render(job, level)?;
        self.send(&payload).await
    }
}
