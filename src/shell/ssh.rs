//! Remote command execution over ssh

use crate::core::{host::{HostSpec, DEFAULT_SSH_PORT}, RenderedCommand};
use crate::shell::{CommandOutput, CommandRunner, ShellError};
use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Runs commands on a remote host with the system `ssh` client
#[derive(Debug, Clone)]
pub struct SshShell {
    host: HostSpec,

    /// Pass `-A` so the remote side can use the local agent (e.g. for git)
    forward_agent: bool,

    /// Timeout for command execution in seconds
    timeout_secs: u64,
}

impl SshShell {
    pub fn new(host: HostSpec, forward_agent: bool, timeout_secs: u64) -> Self {
        Self {
            host,
            forward_agent,
            timeout_secs,
        }
    }

    /// Arguments passed to `ssh` for a command
    pub fn build_args(&self, command: &RenderedCommand) -> Vec<String> {
        let mut args = Vec::new();

        if self.forward_agent {
            args.push("-A".to_string());
        }

        if self.host.port != DEFAULT_SSH_PORT {
            args.push("-p".to_string());
            args.push(self.host.port.to_string());
        }

        // Fail fast instead of hanging on prompts or stalled connections
        args.extend([
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            "ConnectTimeout=10".to_string(),
            "-o".to_string(),
            "ServerAliveInterval=15".to_string(),
            "-o".to_string(),
            "ServerAliveCountMax=3".to_string(),
        ]);

        args.push(self.host.destination());
        args.push(command.remote_invocation());
        args
    }
}

#[async_trait]
impl CommandRunner for SshShell {
    async fn run(&self, command: &RenderedCommand) -> Result<CommandOutput, ShellError> {
        let args = self.build_args(command);
        debug!("[{}] run: {}", self.host, command);

        let result = timeout(
            Duration::from_secs(self.timeout_secs),
            Command::new("ssh").args(&args).kill_on_drop(true).output(),
        )
        .await
        .map_err(|_| ShellError::Timeout(self.timeout_secs))?;

        let output = result.map_err(|e| ShellError::Spawn {
            program: "ssh".to_string(),
            message: e.to_string(),
        })?;

        let output = CommandOutput::from_process(output);
        // ssh reserves 255 for its own connection errors
        if output.exit_code == 255 {
            warn!("[{}] ssh connection error: {}", self.host, output.stderr.trim());
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ShellCommand;
    use std::collections::HashMap;

    fn rendered(cmd: ShellCommand) -> RenderedCommand {
        cmd.render(&HashMap::new())
    }

    #[test]
    fn test_build_args_default_port() {
        let shell = SshShell::new("deploy@pycon.tw".parse().unwrap(), true, 60);
        let args = shell.build_args(&rendered(ShellCommand::remote("uptime")));

        assert_eq!(args[0], "-A");
        assert!(!args.contains(&"-p".to_string()));
        assert!(args.contains(&"BatchMode=yes".to_string()));
        assert_eq!(args[args.len() - 2], "deploy@pycon.tw");
        assert_eq!(args[args.len() - 1], "/bin/bash -l -c 'uptime'");
    }

    #[test]
    fn test_build_args_custom_port_without_agent() {
        let shell = SshShell::new("pycon.tw:2222".parse().unwrap(), false, 60);
        let args = shell.build_args(&rendered(ShellCommand::remote("uptime").with_sudo()));

        assert_eq!(args[0], "-p");
        assert_eq!(args[1], "2222");
        assert!(!args.contains(&"-A".to_string()));
        assert_eq!(args[args.len() - 2], "pycon.tw");
        assert!(args[args.len() - 1].starts_with("sudo -H "));
    }

    #[tokio::test]
    #[ignore] // Requires an ssh server on localhost
    async fn test_ssh_localhost() {
        let shell = SshShell::new("localhost".parse().unwrap(), false, 30);
        let output = shell.run(&rendered(ShellCommand::remote("echo ok"))).await.unwrap();
        assert_eq!(output.stdout.trim(), "ok");
    }
}
