//! Command runners - local processes, ssh, and dry runs

pub mod dry_run;
pub mod local;
pub mod quote;
pub mod ssh;

use crate::core::{RenderedCommand, Target};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use dry_run::DryRunShell;
pub use local::LocalShell;
pub use ssh::SshShell;

/// Error types for running commands
///
/// A command that runs and exits non-zero is not an error here; it comes
/// back as a `CommandOutput` with `success == false`.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("Failed to spawn {program}: {message}")]
    Spawn { program: String, message: String },

    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    #[error("No remote host configured for remote command")]
    NoRemoteHost,
}

/// Captured result of a finished command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: 0,
        }
    }

    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code,
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }

    pub(crate) fn from_process(output: std::process::Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
        }
    }
}

/// Trait for command execution - allows for different implementations
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a command to completion and capture its output
    async fn run(&self, command: &RenderedCommand) -> Result<CommandOutput, ShellError>;

    /// Whether steps must leave the machine untouched (no files, no secrets)
    fn is_dry_run(&self) -> bool {
        false
    }
}

/// Runner that sends local commands to `sh` and remote ones over ssh
#[derive(Debug, Clone)]
pub struct SystemShell {
    local: LocalShell,
    remote: Option<SshShell>,
}

impl SystemShell {
    pub fn new(local: LocalShell, remote: Option<SshShell>) -> Self {
        Self { local, remote }
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }
}

#[async_trait]
impl CommandRunner for SystemShell {
    async fn run(&self, command: &RenderedCommand) -> Result<CommandOutput, ShellError> {
        match command.target {
            Target::Local => self.local.run(command).await,
            Target::Remote => match &self.remote {
                Some(ssh) => ssh.run(command).await,
                None => Err(ShellError::NoRemoteHost),
            },
        }
    }
}
