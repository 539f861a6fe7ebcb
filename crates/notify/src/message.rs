//! Payload rendering for key/value telemetry sinks.
//!
//! The line is positional and tab-delimited:
//!
//! ```text
//! <service_host>\t<service_name>\t<code>\t[<level label>] <job label> (<trigger>)
//! ```
//!
//! Receivers split on tabs, so the shape is fixed. Tabs or newlines inside
//! job fields are passed through unescaped; callers must supply safe values.
//!
//! The text after the severity code is the *summary*. A channel may replace
//! it with a minijinja [`MessageTemplate`]; a fresh [`minijinja::Environment`]
//! is created per render since templates are arbitrary strings.

use backup_core::Job;

use crate::level::NotificationLevel;
use crate::traits::NotifyError;

/// Values exposed to a custom summary template.
#[derive(Debug, Clone, serde::Serialize)]
pub struct MessageContext<'a> {
    /// Level name (`"success"`, `"warning"`, ...).
    pub level: &'static str,
    /// Level label without brackets (`"Backup::Success"`).
    pub label: &'static str,
    pub code: u8,
    pub trigger: &'a str,
    pub duration: Option<&'a str>,
    pub exit_status: i32,
    pub job: &'a Job,
}

impl<'a> MessageContext<'a> {
    pub fn new(job: &'a Job, level: NotificationLevel) -> Self {
        Self {
            level: level.as_str(),
            label: level.label(),
            code: level.code(),
            trigger: &job.trigger,
            duration: job.duration.as_deref(),
            exit_status: job.exit_status,
            job,
        }
    }
}

/// A validated minijinja template for the message summary.
#[derive(Debug, Clone)]
pub struct MessageTemplate {
    source: String,
}

impl MessageTemplate {
    /// Parse `source`, rejecting syntax errors up front.
    pub fn parse(source: impl Into<String>) -> Result<Self, NotifyError> {
        let source = source.into();
        let env = minijinja::Environment::new();
        env.template_from_str(&source)
            .map_err(|e| NotifyError::Template(e.to_string()))?;
        Ok(Self { source })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn render(&self, ctx: &MessageContext<'_>) -> Result<String, NotifyError> {
        let env = minijinja::Environment::new();
        env.render_str(&self.source, ctx)
            .map_err(|e| NotifyError::Template(e.to_string()))
    }
}

/// Default summary: `[<level label>] <job label> (<trigger>)`.
pub fn summary(job: &Job, level: NotificationLevel) -> String {
    format!("[{}] {} ({})", level.label(), job.label, job.trigger)
}

/// Renders the tab-delimited status line for one service.
#[derive(Debug, Clone)]
pub struct MessageFormatter {
    pub service_host: String,
    pub service_name: String,
    pub template: Option<MessageTemplate>,
}

impl MessageFormatter {
    pub fn new(service_host: impl Into<String>, service_name: impl Into<String>) -> Self {
        Self {
            service_host: service_host.into(),
            service_name: service_name.into(),
            template: None,
        }
    }

    pub fn with_template(mut self, template: Option<MessageTemplate>) -> Self {
        self.template = template;
        self
    }

    /// Deterministic: identical inputs give byte-identical output.
    pub fn format(&self, job: &Job, level: NotificationLevel) -> Result<String, NotifyError> {
        let summary = match &self.template {
            Some(template) => template.render(&MessageContext::new(job, level))?,
            None => summary(job, level),
        };
        Ok(format!(
            "{}\t{}\t{}\t{}",
            self.service_host,
            self.service_name,
            level.code(),
            summary
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> Job {
        Job::new("test_trigger", "test label").with_duration("12:34:56")
    }

    fn formatter() -> MessageFormatter {
        MessageFormatter::new("my.service.host", "Backup test_trigger")
    }

    #[test]
    fn success_line() {
        let line = formatter().format(&job(), NotificationLevel::Success).unwrap();
        assert_eq!(
            line,
            "my.service.host\tBackup test_trigger\t0\t[Backup::Success] test label (test_trigger)"
        );
    }

    #[test]
    fn error_line_uses_code_three() {
        let line = formatter().format(&job(), NotificationLevel::Error).unwrap();
        assert_eq!(
            line,
            "my.service.host\tBackup test_trigger\t3\t[Backup::Error] test label (test_trigger)"
        );
    }

    #[test]
    fn output_is_stable_across_calls() {
        let f = formatter();
        let a = f.format(&job(), NotificationLevel::Warning).unwrap();
        let b = f.format(&job(), NotificationLevel::Warning).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn embedded_tabs_are_not_escaped() {
        let job = Job::new("t", "a\tb");
        let line = formatter().format(&job, NotificationLevel::Success).unwrap();
        assert_eq!(line.split('\t').count(), 5);
    }

    #[test]
    fn custom_template_replaces_summary_only() {
        let template =
            MessageTemplate::parse("{{ label }}: {{ job.label }} took {{ job.duration }}").unwrap();
        let line = formatter()
            .with_template(Some(template))
            .format(&job(), NotificationLevel::Failure)
            .unwrap();
        assert_eq!(
            line,
            "my.service.host\tBackup test_trigger\t2\tBackup::Failure: test label took 12:34:56"
        );
    }

    #[test]
    fn template_sees_level_and_code() {
        let template = MessageTemplate::parse("{{ level | upper }}/{{ code }}").unwrap();
        let rendered = template
            .render(&MessageContext::new(&job(), NotificationLevel::Warning))
            .unwrap();
        assert_eq!(rendered, "WARNING/1");
    }

    #[test]
    fn template_sees_top_level_job_fields() {
        let job = Job::new("nightly", "Nightly DB")
            .with_duration("00:01:00")
            .with_exit_status(1);
        let template = MessageTemplate::parse(
            "trigger={{ trigger }} duration={{ duration }} exit={{ exit_status }}",
        )
        .unwrap();
        let rendered = template
            .render(&MessageContext::new(&job, NotificationLevel::Warning))
            .unwrap();
        assert_eq!(rendered, "trigger=nightly duration=00:01:00 exit=1");
    }

    #[test]
    fn invalid_template_is_rejected() {
        let err = MessageTemplate::parse("{{ unclosed").unwrap_err();
        assert!(matches!(err, NotifyError::Template(_)));
    }
}
