//! Dry-run runner: records commands instead of executing them

use crate::core::RenderedCommand;
use crate::shell::{CommandOutput, CommandRunner, ShellError};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tracing::info;

/// Records every command and reports success
#[derive(Debug, Clone, Default)]
pub struct DryRunShell {
    recorded: Arc<Mutex<Vec<RenderedCommand>>>,
}

impl DryRunShell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands seen so far, in order
    pub fn recorded(&self) -> Vec<RenderedCommand> {
        self.recorded
            .lock()
            .map(|cmds| cmds.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl CommandRunner for DryRunShell {
    async fn run(&self, command: &RenderedCommand) -> Result<CommandOutput, ShellError> {
        info!("[dry-run] [{}] {}", command.target, command);
        if let Ok(mut cmds) = self.recorded.lock() {
            cmds.push(command.clone());
        }
        Ok(CommandOutput::success(""))
    }

    fn is_dry_run(&self) -> bool {
        true
    }
}
