//! External process helpers: locating sender binaries and running command lines.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;

use crate::traits::NotifyError;

// ── Binary lookup ───────────────────────────────────────────────────

/// Resolves the logical name of an external tool to something invocable.
pub trait UtilityLocator: Send + Sync {
    fn locate(&self, name: &str) -> String;
}

/// Looks tools up on `PATH`, with optional explicit overrides.
///
/// When a tool cannot be found the logical name is returned unchanged, so
/// the failure shows up when the command runs (and is retried there).
#[derive(Debug, Default, Clone)]
pub struct PathLocator {
    overrides: HashMap<String, PathBuf>,
}

impl PathLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin `name` to an explicit path instead of searching `PATH`.
    pub fn with_override(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.overrides.insert(name.into(), path.into());
        self
    }
}

impl UtilityLocator for PathLocator {
    fn locate(&self, name: &str) -> String {
        if let Some(path) = self.overrides.get(name) {
            return path.to_string_lossy().into_owned();
        }
        match which::which(name) {
            Ok(path) => path.to_string_lossy().into_owned(),
            Err(e) => {
                tracing::warn!(utility = name, error = %e, "utility not found on PATH");
                name.to_string()
            }
        }
    }
}

/// Returns the same command for every lookup.
#[derive(Debug, Clone)]
pub struct FixedLocator(pub String);

impl UtilityLocator for FixedLocator {
    fn locate(&self, _name: &str) -> String {
        self.0.clone()
    }
}

// ── Command execution ───────────────────────────────────────────────

/// Runs a full shell command line once.
#[async_trait::async_trait]
pub trait CommandRunner: Send + Sync {
    /// Succeeds only if the command ran and exited with status 0.
    async fn run(&self, command_line: &str) -> Result<(), NotifyError>;
}

/// Runs command lines through the platform shell (`sh -c` / `cmd /C`).
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellRunner;

impl ShellRunner {
    fn command(command_line: &str) -> tokio::process::Command {
        #[cfg(windows)]
        let mut cmd = {
            let mut cmd = tokio::process::Command::new("cmd");
            cmd.arg("/C").arg(command_line);
            cmd
        };
        #[cfg(not(windows))]
        let mut cmd = {
            let mut cmd = tokio::process::Command::new("sh");
            cmd.arg("-c").arg(command_line);
            cmd
        };
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait::async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, command_line: &str) -> Result<(), NotifyError> {
        let output = Self::command(command_line)
            .output()
            .await
            .map_err(|source| NotifyError::Spawn {
                command: command_line.to_string(),
                source,
            })?;

        if output.status.success() {
            tracing::debug!(
                stdout = %String::from_utf8_lossy(&output.stdout).trim(),
                "command succeeded"
            );
            return Ok(());
        }

        Err(NotifyError::CommandFailed {
            command: command_line.to_string(),
            status: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}
