//! Shared building blocks for backup notifications.
//!
//! The notifier crate treats everything here as an external collaborator:
//! - [`Job`], the read-only view of a finished backup job
//! - [`HostnameResolver`], the process-wide default host lookup
//! - [`NotifyDefaults`], environment-driven defaults applied to every channel

pub mod config;
pub mod error;
pub mod host;
pub mod job;

pub use config::NotifyDefaults;
pub use error::*;
pub use host::{FixedHostname, HostnameResolver, SystemHostname};
pub use job::Job;
