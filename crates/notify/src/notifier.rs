//! Per-channel orchestration: classify, gate, render, retry.
//!
//! One `notify` call moves through
//! `Classified -> GateChecked -> {Suppressed | Attempting} -> {Delivered | Exhausted}`.
//! Only the terminal error crosses this boundary; per-attempt failures stay
//! inside the [`RetryingDispatcher`].

use std::sync::Arc;

use backup_core::Job;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::level::NotificationLevel;
use crate::retry::RetryingDispatcher;
use crate::traits::{Channel, DeliveryAttempt, NotifyError};

/// How a `notify` call ended, short of an error.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum NotifyOutcome {
    /// The level's gate is off; nothing was sent.
    Suppressed { level: NotificationLevel },
    /// The last attempt succeeded.
    Delivered {
        level: NotificationLevel,
        attempts: Vec<DeliveryAttempt>,
    },
}

impl NotifyOutcome {
    pub fn level(&self) -> NotificationLevel {
        match self {
            Self::Suppressed { level } | Self::Delivered { level, .. } => *level,
        }
    }

    pub fn attempts(&self) -> &[DeliveryAttempt] {
        match self {
            Self::Suppressed { .. } => &[],
            Self::Delivered { attempts, .. } => attempts,
        }
    }
}

/// Wraps a [`Channel`] with gating and retry.
///
/// Cheap to clone; clones share the channel and the cancellation token.
#[derive(Clone)]
pub struct Notifier {
    channel: Arc<dyn Channel>,
    cancel: CancellationToken,
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("channel", &self.channel.channel_name())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

impl Notifier {
    pub fn new(channel: impl Channel + 'static) -> Self {
        Self::from_arc(Arc::new(channel))
    }

    pub fn from_arc(channel: Arc<dyn Channel>) -> Self {
        Self {
            channel,
            cancel: CancellationToken::new(),
        }
    }

    /// Tie in-flight retry waits to an external stop signal.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn channel_name(&self) -> &str {
        self.channel.channel_name()
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Notify about `job` using its recorded exit status.
    pub async fn notify_job(&self, job: &Job) -> Result<NotifyOutcome, NotifyError> {
        self.notify(job, job.exit_status).await
    }

    /// Notify about `job` finishing with `exit_status`.
    ///
    /// Returns `Suppressed` without side effects when the level's gate is
    /// off. Otherwise delivers with retry, failing with
    /// [`NotifyError::Exhausted`] or [`NotifyError::Cancelled`].
    pub async fn notify(&self, job: &Job, exit_status: i32) -> Result<NotifyOutcome, NotifyError> {
        let channel = self.channel.channel_name();
        let level = NotificationLevel::classify(exit_status);

        if level == NotificationLevel::Error {
            warn!(
                channel,
                trigger = %job.trigger,
                exit_status,
                "Unexpected exit status, notifying as error"
            );
        }

        if !self.channel.gates().allows(level) {
            debug!(channel, trigger = %job.trigger, %level, "Notification suppressed by gate");
            return Ok(NotifyOutcome::Suppressed { level });
        }

        info!(channel, trigger = %job.trigger, %level, "Sending notification");

        let payload = self.channel.render(job, level)?;
        debug!(channel, payload = %payload, "Rendered notification payload");

        let dispatcher = RetryingDispatcher::new(channel, self.channel.retry_policy(), &self.cancel);
        let attempts = dispatcher
            .execute(&payload, |_| self.channel.send(&payload))
            .await?;

        info!(
            channel,
            trigger = %job.trigger,
            %level,
            attempts = attempts.len(),
            "Notification delivered"
        );

        Ok(NotifyOutcome::Delivered { level, attempts })
    }
}
