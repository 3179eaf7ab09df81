//! Test utilities shared by the scenario tests

#![allow(dead_code)]

use async_trait::async_trait;
use shipline::core::{RenderedCommand, StepState};
use shipline::shell::{CommandOutput, CommandRunner, ShellError};
use shipline::{DeployConfig, Environment, ExecutionError, ExecutionStatus, RunContext, Task, TaskEngine};
use std::sync::{Arc, Mutex};

/// Runner that records commands and answers from a script
///
/// Each rule maps a substring of the command line to a result; the first
/// matching rule wins and unmatched commands succeed with empty output.
#[derive(Clone, Default)]
pub struct ScriptedRunner {
    rules: Arc<Vec<(String, CommandOutput)>>,
    recorded: Arc<Mutex<Vec<RenderedCommand>>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule(mut self, pattern: &str, output: CommandOutput) -> Self {
        Arc::make_mut(&mut self.rules).push((pattern.to_string(), output));
        self
    }

    pub fn fail_on(self, pattern: &str, exit_code: i32) -> Self {
        self.with_rule(pattern, CommandOutput::failure(exit_code, format!("{} failed", pattern)))
    }

    pub fn respond(self, pattern: &str, stdout: &str) -> Self {
        self.with_rule(pattern, CommandOutput::success(stdout))
    }

    pub fn recorded(&self) -> Vec<RenderedCommand> {
        self.recorded.lock().unwrap().clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.recorded().into_iter().map(|c| c.line).collect()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, command: &RenderedCommand) -> Result<CommandOutput, ShellError> {
        self.recorded.lock().unwrap().push(command.clone());

        let output = self
            .rules
            .iter()
            .find(|(pattern, _)| command.line.contains(pattern.as_str()))
            .map(|(_, output)| output.clone())
            .unwrap_or_else(|| CommandOutput::success(""));
        Ok(output)
    }
}

/// Configuration with every deploy setting filled in
pub fn deploy_config() -> DeployConfig {
    DeployConfig {
        project_dir: "/srv/pycontw".to_string(),
        project_name: "src".to_string(),
        virtualenv_name: "pycontw".to_string(),
        supervisor_name: "pycontw-web".to_string(),
        host: Some("deploy@pycon.tw".parse().unwrap()),
        ..DeployConfig::default()
    }
}

/// Run a task with a scripted runner
pub async fn run_task(
    task: &mut Task,
    runner: ScriptedRunner,
    context: &mut RunContext,
) -> Result<(), ExecutionError> {
    TaskEngine::new(runner).execute(task, context).await
}

/// A context over an explicit environment and a throwaway home directory
pub fn context_with(env: Environment, home: &std::path::Path) -> RunContext {
    RunContext::new(env).with_home_dir(home)
}

pub fn assert_status(task: &Task, status: ExecutionStatus) {
    assert_eq!(
        task.state.status, status,
        "Task {} should be {:?}, got {:?}",
        task.name, status, task.state.status
    );
}

pub fn assert_step_completed(task: &Task, step_id: &str) {
    let step = task.step(step_id).unwrap_or_else(|| panic!("Step {} should exist", step_id));
    assert!(
        matches!(step.state, StepState::Completed { .. }),
        "Step {} should be Completed, got {:?}",
        step_id,
        step.state
    );
}

pub fn assert_step_failed(task: &Task, step_id: &str) {
    let step = task.step(step_id).unwrap_or_else(|| panic!("Step {} should exist", step_id));
    assert!(
        matches!(step.state, StepState::Failed { .. }),
        "Step {} should be Failed, got {:?}",
        step_id,
        step.state
    );
}

pub fn assert_step_tolerated(task: &Task, step_id: &str) {
    let step = task.step(step_id).unwrap_or_else(|| panic!("Step {} should exist", step_id));
    assert!(
        matches!(step.state, StepState::Tolerated { .. }),
        "Step {} should be Tolerated, got {:?}",
        step_id,
        step.state
    );
}

pub fn assert_step_skipped(task: &Task, step_id: &str) {
    let step = task.step(step_id).unwrap_or_else(|| panic!("Step {} should exist", step_id));
    assert!(
        matches!(step.state, StepState::Skipped { .. }),
        "Step {} should be Skipped, got {:?}",
        step_id,
        step.state
    );
}
