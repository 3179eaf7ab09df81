//! Step executor - runs individual steps against a command runner

use crate::{
    core::{
        context::unresolved_placeholders, credentials::CredentialStatus, OnFailure, RunContext,
        ShellCommand, Step, StepAction,
    },
    shell::CommandRunner,
};
use tracing::{debug, error, info, warn};

/// Result of executing a step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Step succeeded
    Completed { output: String },
    /// Step failed but the task continues
    Tolerated { exit_code: i32, error: String },
    /// Step failed and the task ends successfully without running later steps
    Finished { exit_code: i32, error: String },
    /// Step failed and the task fails
    Failed { error: String, exit_code: Option<i32> },
}

/// Executes a single step
pub struct StepExecutor<R> {
    runner: R,
}

impl<R: CommandRunner> StepExecutor<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Execute a step and classify the result
    pub async fn execute(&self, step: &Step, context: &RunContext) -> StepOutcome {
        info!("Executing step: {}", step.id);

        match &step.action {
            StepAction::Shell(command) => self.execute_shell(&step.id, command, context).await,
            StepAction::Credential(file) if self.runner.is_dry_run() => {
                info!("[dry-run] would write {}", file.display_path());
                StepOutcome::Completed {
                    output: format!("would write {}", file.display_path()),
                }
            }
            StepAction::Credential(file) => {
                match file.ensure(context.home_dir(), &context.environment) {
                    Ok(CredentialStatus::Written) => {
                        info!("Wrote {}", file.display_path());
                        StepOutcome::Completed {
                            output: format!("wrote {}", file.display_path()),
                        }
                    }
                    Ok(CredentialStatus::AlreadyPresent) => {
                        debug!("{} already present", file.display_path());
                        StepOutcome::Completed {
                            output: format!("{} already present", file.display_path()),
                        }
                    }
                    Err(e) => {
                        error!("Credential step {} failed: {}", step.id, e);
                        StepOutcome::Failed {
                            error: e.to_string(),
                            exit_code: None,
                        }
                    }
                }
            }
        }
    }

    async fn execute_shell(
        &self,
        step_id: &str,
        command: &ShellCommand,
        context: &RunContext,
    ) -> StepOutcome {
        let rendered = command.render(&context.get_rendering_variables());

        let missing = unresolved_placeholders(&rendered.line);
        if !missing.is_empty() {
            error!("Step {} has unresolved placeholders: {:?}", step_id, missing);
            return StepOutcome::Failed {
                error: format!("Unresolved placeholders: {}", missing.join(", ")),
                exit_code: None,
            };
        }

        debug!("Command for step {}: {}", step_id, rendered);

        let output = match self.runner.run(&rendered).await {
            Ok(output) => output,
            Err(e) => {
                error!("Step {} could not run: {}", step_id, e);
                return StepOutcome::Failed {
                    error: e.to_string(),
                    exit_code: None,
                };
            }
        };

        if output.is_success() {
            info!("Step {} completed successfully", step_id);
            return StepOutcome::Completed {
                output: output.stdout,
            };
        }

        let detail = output.stderr.trim();
        let error = if detail.is_empty() {
            format!("exited with code {}", output.exit_code)
        } else {
            format!("exited with code {}: {}", output.exit_code, detail)
        };

        match command.on_failure {
            OnFailure::Abort => {
                error!("Step {} {}", step_id, error);
                StepOutcome::Failed {
                    error,
                    exit_code: Some(output.exit_code),
                }
            }
            OnFailure::Continue => {
                warn!("Step {} {} (ignored)", step_id, error);
                StepOutcome::Tolerated {
                    exit_code: output.exit_code,
                    error,
                }
            }
            OnFailure::Finish => {
                warn!("Step {} {}; ending task", step_id, error);
                if !output.stdout.trim().is_empty() {
                    warn!("{}", output.stdout.trim());
                }
                StepOutcome::Finished {
                    exit_code: output.exit_code,
                    error,
                }
            }
        }
    }
}
