//! Job outcome classification.
//!
//! A job's exit status maps onto a closed set of [`NotificationLevel`]s,
//! each with a stable severity code that receiving systems key on.

use std::fmt;

/// Notification level derived from a job's exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Warning,
    Failure,
    /// Any exit status outside 0..=2.
    Error,
}

impl NotificationLevel {
    /// Classify a raw exit status. Total over all integers.
    pub fn classify(exit_status: i32) -> Self {
        match exit_status {
            0 => Self::Success,
            1 => Self::Warning,
            2 => Self::Failure,
            _ => Self::Error,
        }
    }

    /// Severity code sent to monitoring systems. Matches the exit status for
    /// the three known outcomes.
    pub const fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Warning => 1,
            Self::Failure => 2,
            Self::Error => 3,
        }
    }

    /// Display label, rendered inside brackets in messages.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Success => "Backup::Success",
            Self::Warning => "Backup::Warning",
            Self::Failure => "Backup::Failure",
            Self::Error => "Backup::Error",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Failure => "failure",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-level opt-outs for a channel.
///
/// There is no gate for [`NotificationLevel::Error`]: an unclassifiable
/// status is always reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Gates {
    pub on_success: bool,
    pub on_warning: bool,
    pub on_failure: bool,
}

impl Default for Gates {
    fn default() -> Self {
        Self {
            on_success: true,
            on_warning: true,
            on_failure: true,
        }
    }
}

impl Gates {
    pub fn allows(&self, level: NotificationLevel) -> bool {
        match level {
            NotificationLevel::Success => self.on_success,
            NotificationLevel::Warning => self.on_warning,
            NotificationLevel::Failure => self.on_failure,
            NotificationLevel::Error => true,
        }
    }
}
