use serde::{Deserialize, Serialize};

/// A finished backup job, as seen by notifiers.
///
/// `exit_status` follows the backup convention: 0 = success, 1 = warning,
/// 2 = failure, anything else is an unexpected error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Trigger name the job was started with (e.g. `daily_db`).
    pub trigger: String,
    /// Human-readable label.
    pub label: String,
    /// Formatted run time (e.g. `"12:34:56"`), if the job recorded one.
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub exit_status: i32,
}

impl Job {
    pub fn new(trigger: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            trigger: trigger.into(),
            label: label.into(),
            duration: None,
            exit_status: 0,
        }
    }

    pub fn with_duration(mut self, duration: impl Into<String>) -> Self {
        self.duration = Some(duration.into());
        self
    }

    pub fn with_exit_status(mut self, exit_status: i32) -> Self {
        self.exit_status = exit_status;
        self
    }
}
