//! Main execution engine - runs a task's steps in order

use crate::{
    core::{
        guard::GuardDecision, ExecutionStatus, RunContext, StepAction, StepState, Task,
    },
    execution::{StepExecutor, StepOutcome},
    shell::CommandRunner,
};
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Why a task run did not complete
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Step {step_id} failed: {error}")]
    StepFailed { step_id: String, error: String },
}

/// Events that can occur while a task runs
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    TaskStarted {
        run_id: Uuid,
        task_name: String,
        total_steps: usize,
    },
    TaskSkipped {
        task_name: String,
        reason: String,
    },
    StepStarted {
        step_id: String,
        index: usize,
        total: usize,
        command: String,
    },
    StepOutput {
        step_id: String,
        output: String,
    },
    StepCompleted {
        step_id: String,
    },
    StepTolerated {
        step_id: String,
        error: String,
    },
    TaskEndedEarly {
        step_id: String,
        error: String,
    },
    StepFailed {
        step_id: String,
        error: String,
    },
    TaskCompleted {
        run_id: Uuid,
        status: ExecutionStatus,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(ExecutionEvent) + Send + Sync>;

/// Runs tasks step by step, stopping at the first failure
pub struct TaskEngine<R> {
    executor: StepExecutor<R>,
    event_handlers: Vec<EventHandler>,
}

impl<R: CommandRunner> TaskEngine<R> {
    pub fn new(runner: R) -> Self {
        Self {
            executor: StepExecutor::new(runner),
            event_handlers: Vec::new(),
        }
    }

    /// Add an event handler
    pub fn with_event_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(ExecutionEvent) + Send + Sync + 'static,
    {
        self.event_handlers.push(Arc::new(handler));
        self
    }

    /// The runner commands are sent to
    pub fn runner(&self) -> &R {
        self.executor.runner()
    }

    fn emit_event(&self, event: ExecutionEvent) {
        for handler in &self.event_handlers {
            handler(event.clone());
        }
    }

    /// Execute the whole task
    ///
    /// Returns `Ok` when the task completed or its guard skipped it, and
    /// `Err` when a step failed. The task's state records the outcome
    /// either way.
    pub async fn execute(
        &self,
        task: &mut Task,
        context: &mut RunContext,
    ) -> Result<(), ExecutionError> {
        let run_id = task.state.run_id;
        let total = task.steps.len();

        info!("Starting task: {} ({})", task.name, run_id);
        self.emit_event(ExecutionEvent::TaskStarted {
            run_id,
            task_name: task.name.clone(),
            total_steps: total,
        });

        let decision = task
            .guard
            .as_ref()
            .map(|guard| guard.evaluate(&context.ci, &task.name));

        if let Some(GuardDecision::Skip(reason)) = decision {
            warn!("{}", reason);
            skip_remaining(task, 0, &reason);
            task.state.skip();
            self.emit_event(ExecutionEvent::TaskSkipped {
                task_name: task.name.clone(),
                reason,
            });
            self.emit_event(ExecutionEvent::TaskCompleted {
                run_id,
                status: ExecutionStatus::Skipped,
            });
            return Ok(());
        }

        task.state.start(total);

        for index in 0..total {
            let step_id = task.steps[index].id.clone();
            let planned = task.steps[index].plan(&context.get_rendering_variables());
            let started_at = Utc::now();
            task.steps[index].state = StepState::Running { started_at };

            self.emit_event(ExecutionEvent::StepStarted {
                step_id: step_id.clone(),
                index: index + 1,
                total,
                command: planned.command,
            });

            let outcome = self.executor.execute(&task.steps[index], context).await;

            match outcome {
                StepOutcome::Completed { output } => {
                    if let StepAction::Shell(command) = &task.steps[index].action {
                        if let Some(name) = &command.capture {
                            context.set_variable(name.clone(), output.trim());
                        }
                    }
                    context.set_step_output(&step_id, output.clone());
                    task.steps[index].state = StepState::Completed {
                        output: output.clone(),
                        started_at,
                        completed_at: Utc::now(),
                    };
                    task.state.completed_steps += 1;

                    if !output.trim().is_empty() {
                        self.emit_event(ExecutionEvent::StepOutput {
                            step_id: step_id.clone(),
                            output,
                        });
                    }
                    self.emit_event(ExecutionEvent::StepCompleted { step_id });
                }
                StepOutcome::Tolerated { exit_code, error } => {
                    task.steps[index].state = StepState::Tolerated {
                        exit_code,
                        error: error.clone(),
                        started_at,
                        completed_at: Utc::now(),
                    };
                    task.state.tolerated_steps += 1;
                    self.emit_event(ExecutionEvent::StepTolerated { step_id, error });
                }
                StepOutcome::Finished { exit_code, error } => {
                    task.steps[index].state = StepState::Tolerated {
                        exit_code,
                        error: error.clone(),
                        started_at,
                        completed_at: Utc::now(),
                    };
                    task.state.tolerated_steps += 1;
                    skip_remaining(task, index + 1, &format!("task ended by {}", step_id));
                    task.state.complete();

                    info!("Task {} ended early at step {}", task.name, step_id);
                    self.emit_event(ExecutionEvent::TaskEndedEarly { step_id, error });
                    self.emit_event(ExecutionEvent::TaskCompleted {
                        run_id,
                        status: ExecutionStatus::Completed,
                    });
                    return Ok(());
                }
                StepOutcome::Failed { error, exit_code } => {
                    task.steps[index].state = StepState::Failed {
                        error: error.clone(),
                        exit_code,
                        started_at,
                        failed_at: Utc::now(),
                    };
                    skip_remaining(task, index + 1, &format!("{} failed", step_id));
                    task.state.fail();

                    error!("Task {} failed at step {}: {}", task.name, step_id, error);
                    self.emit_event(ExecutionEvent::StepFailed {
                        step_id: step_id.clone(),
                        error: error.clone(),
                    });
                    self.emit_event(ExecutionEvent::TaskCompleted {
                        run_id,
                        status: ExecutionStatus::Failed,
                    });
                    return Err(ExecutionError::StepFailed { step_id, error });
                }
            }
        }

        task.state.complete();
        info!("Task finished: {} - {:?}", task.name, task.state.status);
        self.emit_event(ExecutionEvent::TaskCompleted {
            run_id,
            status: ExecutionStatus::Completed,
        });

        Ok(())
    }
}

/// Mark steps from `from` onwards as skipped
fn skip_remaining(task: &mut Task, from: usize, reason: &str) {
    for step in task.steps.iter_mut().skip(from) {
        step.state = StepState::Skipped {
            reason: reason.to_string(),
        };
    }
}
