//! Notification engine for backup job outcomes.
//!
//! This crate provides:
//! - `NotificationLevel` classification of job exit statuses
//! - `MessageFormatter` for the tab-delimited status line
//! - `RetryingDispatcher`, a fixed-interval cancellable retry loop
//! - `Notifier`, which gates, renders and retries on top of a `Channel`
//! - `ZabbixChannel`, delivering through `zabbix_sender`
//! - `Dispatcher` for fanning one job out to several notifiers

pub mod dispatcher;
pub mod level;
pub mod message;
pub mod notifier;
pub mod process;
pub mod retry;
pub mod traits;
pub mod zabbix;

pub use dispatcher::{DispatchResult, Dispatcher};
pub use level::{Gates, NotificationLevel};
pub use message::{MessageFormatter, MessageTemplate};
pub use notifier::{Notifier, NotifyOutcome};
pub use process::{CommandRunner, FixedLocator, PathLocator, ShellRunner, UtilityLocator};
pub use retry::{RetryPolicy, RetryingDispatcher};
pub use traits::{AttemptOutcome, Channel, DeliveryAttempt, NotifyError};
pub use zabbix::{ZabbixChannel, ZabbixChannelBuilder, ZabbixConfig};
