use std::env;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

pub(crate) fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn parsed_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

// ── Notify defaults ───────────────────────────────────────────

pub const DEFAULT_ZABBIX_PORT: u16 = 10_051;
pub const DEFAULT_ITEM_KEY: &str = "backup_status";
pub const DEFAULT_MAX_RETRIES: u32 = 10;
pub const DEFAULT_RETRY_WAITSEC: u64 = 30;

/// Defaults shared by every notification channel, applied before the
/// channel's own configuration callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyDefaults {
    /// Zabbix server; `None` means "use the resolved hostname".
    pub zabbix_host: Option<String>,
    pub zabbix_port: u16,
    pub item_key: String,
    pub max_retries: u32,
    pub retry_waitsec: u64,
}

impl Default for NotifyDefaults {
    fn default() -> Self {
        Self {
            zabbix_host: None,
            zabbix_port: DEFAULT_ZABBIX_PORT,
            item_key: DEFAULT_ITEM_KEY.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_waitsec: DEFAULT_RETRY_WAITSEC,
        }
    }
}

impl NotifyDefaults {
    /// Build defaults from environment variables (call `load_dotenv()` first).
    ///
    /// Reads `ZABBIX_HOST`, `ZABBIX_PORT`, `ZABBIX_ITEM_KEY`,
    /// `NOTIFY_MAX_RETRIES` and `NOTIFY_RETRY_WAITSEC`. Unparseable numbers
    /// fall back to the built-in value.
    pub fn from_env() -> Self {
        Self::from_lookup(env_opt)
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let base = Self::default();
        Self {
            zabbix_host: lookup("ZABBIX_HOST").filter(|s| !s.is_empty()),
            zabbix_port: parsed_or(lookup("ZABBIX_PORT"), base.zabbix_port),
            item_key: lookup("ZABBIX_ITEM_KEY")
                .filter(|s| !s.is_empty())
                .unwrap_or(base.item_key),
            max_retries: parsed_or(lookup("NOTIFY_MAX_RETRIES"), base.max_retries),
            retry_waitsec: parsed_or(lookup("NOTIFY_RETRY_WAITSEC"), base.retry_waitsec),
        }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Notify defaults loaded:");
        tracing::info!(
            "  zabbix:  host={}, port={}, item_key={}",
            self.zabbix_host.as_deref().unwrap_or("(hostname)"),
            self.zabbix_port,
            self.item_key
        );
        tracing::info!(
            "  retry:   max_retries={}, retry_waitsec={}",
            self.max_retries,
            self.retry_waitsec
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn built_in_defaults() {
        let defaults = NotifyDefaults::from_lookup(|_| None);
        assert_eq!(defaults, NotifyDefaults::default());
        assert_eq!(defaults.zabbix_port, 10_051);
        assert_eq!(defaults.item_key, "backup_status");
        assert_eq!(defaults.max_retries, 10);
        assert_eq!(defaults.retry_waitsec, 30);
        assert!(defaults.zabbix_host.is_none());
    }

    #[test]
    fn env_overrides_are_applied() {
        let defaults = NotifyDefaults::from_lookup(lookup_from(&[
            ("ZABBIX_HOST", "monitor.internal"),
            ("ZABBIX_PORT", "1234"),
            ("ZABBIX_ITEM_KEY", "nightly_status"),
            ("NOTIFY_MAX_RETRIES", "3"),
            ("NOTIFY_RETRY_WAITSEC", "5"),
        ]));
        assert_eq!(defaults.zabbix_host.as_deref(), Some("monitor.internal"));
        assert_eq!(defaults.zabbix_port, 1234);
        assert_eq!(defaults.item_key, "nightly_status");
        assert_eq!(defaults.max_retries, 3);
        assert_eq!(defaults.retry_waitsec, 5);
    }

    #[test]
    fn load_dotenv_tolerates_missing_file_and_from_env_reads_process() {
        load_dotenv();
        std::env::set_var("NOTIFY_RETRY_WAITSEC", "7");
        let defaults = NotifyDefaults::from_env();
        std::env::remove_var("NOTIFY_RETRY_WAITSEC");
        assert_eq!(defaults.retry_waitsec, 7);
        defaults.log_summary();
    }

    #[test]
    fn garbage_numbers_fall_back() {
        let defaults = NotifyDefaults::from_lookup(lookup_from(&[
            ("ZABBIX_PORT", "not-a-port"),
            ("NOTIFY_MAX_RETRIES", "-1"),
        ]));
        assert_eq!(defaults.zabbix_port, 10_051);
        assert_eq!(defaults.max_retries, 10);
    }
}
