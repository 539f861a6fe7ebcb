//! Process-wide default host lookup.
//!
//! Channels ask a [`HostnameResolver`] once, at construction, for any host
//! field the caller left unset.

use crate::config::env_opt;
use crate::error::CoreError;

/// Env var that overrides the OS hostname for every channel.
pub const HOSTNAME_ENV: &str = "BACKUP_HOSTNAME";

pub trait HostnameResolver: Send + Sync {
    fn hostname(&self) -> Result<String, CoreError>;
}

/// Resolves `BACKUP_HOSTNAME`, falling back to the OS hostname.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemHostname;

impl HostnameResolver for SystemHostname {
    fn hostname(&self) -> Result<String, CoreError> {
        if let Some(name) = env_opt(HOSTNAME_ENV) {
            return Ok(name);
        }

        let raw = ::hostname::get()?;
        let name = raw.into_string().map_err(|raw| {
            CoreError::Hostname(format!("hostname is not valid UTF-8: {raw:?}"))
        })?;
        non_empty(name)
    }
}

/// Always returns the same host.
#[derive(Debug, Clone)]
pub struct FixedHostname(pub String);

impl FixedHostname {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl HostnameResolver for FixedHostname {
    fn hostname(&self) -> Result<String, CoreError> {
        non_empty(self.0.clone())
    }
}

fn non_empty(name: String) -> Result<String, CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Hostname("hostname is empty".to_string()));
    }
    Ok(trimmed.to_string())
}
