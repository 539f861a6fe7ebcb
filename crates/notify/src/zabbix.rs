//! Zabbix notifier backed by the `zabbix_sender` command-line tool.
//!
//! Each delivery runs one command of the shape
//!
//! ```text
//! zabbix_sender -z '<zabbix_host>' -p '<port>' -s <service_host> -k <item_key> -o '<message>'
//! ```
//!
//! Flag order and quoting (host, port and message single-quoted, the rest
//! bare) match what existing monitoring agents expect.

use std::sync::Arc;

use backup_core::{HostnameResolver, Job, NotifyDefaults, SystemHostname};

use crate::level::{Gates, NotificationLevel};
use crate::message::{MessageFormatter, MessageTemplate};
use crate::process::{CommandRunner, PathLocator, ShellRunner, UtilityLocator};
use crate::retry::RetryPolicy;
use crate::traits::{Channel, NotifyError};

/// Logical name of the sender binary.
pub const SENDER_UTILITY: &str = "zabbix_sender";

/// Settings for a [`ZabbixChannel`].
///
/// Host fields left empty are filled from the hostname resolver when the
/// channel is built.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ZabbixConfig {
    /// Zabbix server or proxy receiving the value.
    pub zabbix_host: String,
    pub zabbix_port: u16,
    /// Zabbix-side service name; defaults to `"Backup <trigger>"`.
    pub service_name: String,
    /// Host the item belongs to.
    pub service_host: String,
    pub item_key: String,

    pub on_success: bool,
    pub on_warning: bool,
    pub on_failure: bool,

    pub max_retries: u32,
    pub retry_waitsec: u64,

    /// Optional minijinja template for the message summary.
    pub message: Option<String>,
}

impl ZabbixConfig {
    fn defaults_for(job: &Job, defaults: &NotifyDefaults) -> Self {
        let gates = Gates::default();
        Self {
            zabbix_host: defaults.zabbix_host.clone().unwrap_or_default(),
            zabbix_port: defaults.zabbix_port,
            service_name: format!("Backup {}", job.trigger),
            service_host: String::new(),
            item_key: defaults.item_key.clone(),
            on_success: gates.on_success,
            on_warning: gates.on_warning,
            on_failure: gates.on_failure,
            max_retries: defaults.max_retries,
            retry_waitsec: defaults.retry_waitsec,
            message: None,
        }
    }

    pub fn gates(&self) -> Gates {
        Gates {
            on_success: self.on_success,
            on_warning: self.on_warning,
            on_failure: self.on_failure,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.retry_waitsec)
    }

    fn validate(&self) -> Result<(), NotifyError> {
        if self.zabbix_port == 0 {
            return Err(NotifyError::Config("zabbix_port must not be 0".to_string()));
        }
        if self.service_name.trim().is_empty() {
            return Err(NotifyError::Config("service_name must not be empty".to_string()));
        }
        if self.item_key.trim().is_empty() {
            return Err(NotifyError::Config("item_key must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Fluent builder for a [`ZabbixChannel`].
///
/// # Example
/// ```ignore
/// let channel = ZabbixChannel::builder(&job)
///     .configure(|zabbix| {
///         zabbix.zabbix_host = "monitor.internal".into();
///         zabbix.on_success = false;
///     })
///     .build()?;
/// ```
pub struct ZabbixChannelBuilder<'a> {
    job: &'a Job,
    defaults: NotifyDefaults,
    resolver: Box<dyn HostnameResolver>,
    locator: Arc<dyn UtilityLocator>,
    runner: Arc<dyn CommandRunner>,
    configure: Option<Box<dyn FnOnce(&mut ZabbixConfig) + 'a>>,
}

impl<'a> ZabbixChannelBuilder<'a> {
    fn new(job: &'a Job) -> Self {
        Self {
            job,
            defaults: NotifyDefaults::default(),
            resolver: Box::new(SystemHostname),
            locator: Arc::new(PathLocator::new()),
            runner: Arc::new(ShellRunner),
            configure: None,
        }
    }

    /// Shared defaults applied before the configuration callback.
    pub fn defaults(mut self, defaults: NotifyDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Source for host fields left empty (default: [`SystemHostname`]).
    pub fn hostname_resolver(mut self, resolver: impl HostnameResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    pub fn locator(mut self, locator: impl UtilityLocator + 'static) -> Self {
        self.locator = Arc::new(locator);
        self
    }

    pub fn runner(mut self, runner: impl CommandRunner + 'static) -> Self {
        self.runner = Arc::new(runner);
        self
    }

    /// Set the configuration callback. Applied once, in [`build`](Self::build).
    pub fn configure(mut self, f: impl FnOnce(&mut ZabbixConfig) + 'a) -> Self {
        self.configure = Some(Box::new(f));
        self
    }

    /// Apply defaults and the callback, resolve hosts and validate.
    pub fn build(self) -> Result<ZabbixChannel, NotifyError> {
        let mut config = ZabbixConfig::defaults_for(self.job, &self.defaults);
        if let Some(configure) = self.configure {
            configure(&mut config);
        }

        if config.zabbix_host.is_empty() || config.service_host.is_empty() {
            let hostname = self
                .resolver
                .hostname()
                .map_err(|e| NotifyError::Config(format!("cannot resolve default host: {e}")))?;
            if config.zabbix_host.is_empty() {
                config.zabbix_host = hostname.clone();
            }
            if config.service_host.is_empty() {
                config.service_host = hostname;
            }
        }

        config.validate()?;

        let template = config
            .message
            .as_deref()
            .map(MessageTemplate::parse)
            .transpose()
            .map_err(|e| NotifyError::Config(format!("invalid message template: {e}")))?;

        let formatter = MessageFormatter::new(&config.service_host, &config.service_name)
            .with_template(template);

        tracing::debug!(
            zabbix_host = %config.zabbix_host,
            zabbix_port = config.zabbix_port,
            service_host = %config.service_host,
            item_key = %config.item_key,
            "zabbix notifier configured"
        );

        Ok(ZabbixChannel {
            config,
            formatter,
            locator: self.locator,
            runner: self.runner,
        })
    }
}

/// Reports job outcomes to Zabbix through `zabbix_sender`.
pub struct ZabbixChannel {
    config: ZabbixConfig,
    formatter: MessageFormatter,
    locator: Arc<dyn UtilityLocator>,
    runner: Arc<dyn CommandRunner>,
}

impl std::fmt::Debug for ZabbixChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZabbixChannel")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ZabbixChannel {
    pub fn builder(job: &Job) -> ZabbixChannelBuilder<'_> {
        ZabbixChannelBuilder::new(job)
    }

    /// Build with environment defaults and the system hostname.
    pub fn from_env(job: &Job) -> Result<Self, NotifyError> {
        Self::builder(job).defaults(NotifyDefaults::from_env()).build()
    }

    pub fn config(&self) -> &ZabbixConfig {
        &self.config
    }

    /// The status line passed via `-o`.
    pub fn message(&self, job: &Job, level: NotificationLevel) -> Result<String, NotifyError> {
        self.formatter.format(job, level)
    }

    /// Full `zabbix_sender` invocation for `job` at `level`.
    pub fn command_line(&self, job: &Job, level: NotificationLevel) -> Result<String, NotifyError> {
        let message = self.message(job, level)?;
        let sender = self.locator.locate(SENDER_UTILITY);
        Ok(format!(
            "{} -z '{}' -p '{}' -s {} -k {} -o '{}'",
            sender,
            self.config.zabbix_host,
            self.config.zabbix_port,
            self.config.service_host,
            self.config.item_key,
            message
        ))
    }
}

#[async_trait::async_trait]
impl Channel for ZabbixChannel {
    fn channel_name(&self) -> &str {
        "zabbix"
    }

    fn gates(&self) -> Gates {
        self.config.gates()
    }

    fn retry_policy(&self) -> RetryPolicy {
        self.config.retry_policy()
    }

    fn render(&self, job: &Job, level: NotificationLevel) -> Result<String, NotifyError> {
        self.command_line(job, level)
    }

    async fn send(&self, payload: &str) -> Result<(), NotifyError> {
        self.runner.run(payload).await
    }
}
