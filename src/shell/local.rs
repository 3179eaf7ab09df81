//! Local command execution through `sh -c`

use crate::core::RenderedCommand;
use crate::shell::{CommandOutput, CommandRunner, ShellError};
use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Runs commands on the local machine
#[derive(Debug, Clone)]
pub struct LocalShell {
    /// Timeout for command execution in seconds
    timeout_secs: u64,
}

impl LocalShell {
    pub fn new(timeout_secs: u64) -> Self {
        Self { timeout_secs }
    }
}

#[async_trait]
impl CommandRunner for LocalShell {
    async fn run(&self, command: &RenderedCommand) -> Result<CommandOutput, ShellError> {
        if command.sudo {
            warn!("sudo is ignored for local command: {}", command.line);
        }
        debug!("Running local command: {}", command);

        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(&command.line).kill_on_drop(true);
        if let Some(dir) = &command.cwd {
            cmd.current_dir(dir);
        }

        let result = timeout(Duration::from_secs(self.timeout_secs), cmd.output())
            .await
            .map_err(|_| ShellError::Timeout(self.timeout_secs))?;

        let output = result.map_err(|e| ShellError::Spawn {
            program: "sh".to_string(),
            message: e.to_string(),
        })?;

        let output = CommandOutput::from_process(output);
        debug!("Local command exited with code {}", output.exit_code);
        Ok(output)
    }
}
