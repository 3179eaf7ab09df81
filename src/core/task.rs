//! Task domain model

use crate::core::{
    command::{OnFailure, ShellCommand, Target},
    credentials::CredentialFile,
    guard::BranchGuard,
    state::{StepState, TaskState},
};
use serde::Serialize;
use std::collections::HashMap;

/// What a step does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepAction {
    /// Run a shell command
    Shell(ShellCommand),
    /// Write a credential file if it is missing
    Credential(CredentialFile),
}

/// A single step in a task
#[derive(Debug, Clone)]
pub struct Step {
    /// Step identifier, unique within the task
    pub id: String,

    pub action: StepAction,

    /// Runtime state
    pub state: StepState,
}

impl Step {
    pub fn shell(id: impl Into<String>, command: ShellCommand) -> Self {
        Self {
            id: id.into(),
            action: StepAction::Shell(command),
            state: StepState::Pending,
        }
    }

    pub fn credential(id: impl Into<String>, file: CredentialFile) -> Self {
        Self {
            id: id.into(),
            action: StepAction::Credential(file),
            state: StepState::Pending,
        }
    }

    /// Describe the step for `plan` output, rendering with `variables`
    pub fn plan(&self, variables: &HashMap<String, String>) -> PlannedStep {
        match &self.action {
            StepAction::Shell(command) => PlannedStep {
                id: self.id.clone(),
                target: Some(command.target),
                command: command.render(variables).to_string(),
                on_failure: command.on_failure,
            },
            StepAction::Credential(file) => PlannedStep {
                id: self.id.clone(),
                target: Some(Target::Local),
                command: format!("write {} if missing", file.display_path()),
                on_failure: OnFailure::Abort,
            },
        }
    }
}

/// Printable description of a step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedStep {
    pub id: String,
    pub target: Option<Target>,
    pub command: String,
    pub on_failure: OnFailure,
}

/// A named chain of steps run in order
#[derive(Debug, Clone)]
pub struct Task {
    /// Task name as used on the command line
    pub name: String,

    /// One-line description
    pub description: String,

    /// Optional CI branch restriction checked before any step runs
    pub guard: Option<BranchGuard>,

    /// Steps in execution order
    pub steps: Vec<Step>,

    /// Execution state
    pub state: TaskState,
}

impl Task {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            guard: None,
            steps: Vec::new(),
            state: TaskState::new(),
        }
    }

    pub fn with_guard(mut self, guard: BranchGuard) -> Self {
        self.guard = Some(guard);
        self
    }

    pub fn with_step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn with_steps<I: IntoIterator<Item = Step>>(mut self, steps: I) -> Self {
        self.steps.extend(steps);
        self
    }

    /// Get a step by ID
    pub fn step(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Step IDs in execution order
    pub fn step_ids(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.id.as_str()).collect()
    }

    /// Whether all steps reached a terminal state
    pub fn is_complete(&self) -> bool {
        self.steps.iter().all(|s| s.state.is_terminal())
    }

    /// Describe every step
    pub fn plan(&self, variables: &HashMap<String, String>) -> Vec<PlannedStep> {
        self.steps.iter().map(|s| s.plan(variables)).collect()
    }

    /// Whether any step runs on the remote host
    pub fn uses_remote(&self) -> bool {
        self.steps.iter().any(|s| {
            matches!(&s.action, StepAction::Shell(cmd) if cmd.target == Target::Remote)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::CiConfig;

    fn sample() -> Task {
        Task::new("sample", "A sample task")
            .with_step(Step::credential("rc", CredentialFile::transifexrc(&CiConfig::default())))
            .with_step(Step::shell(
                "pull",
                ShellCommand::remote("git pull origin master").in_dir("/srv/app"),
            ))
    }

    #[test]
    fn test_step_lookup() {
        let task = sample();
        assert_eq!(task.step_ids(), vec!["rc", "pull"]);
        assert!(task.step("pull").is_some());
        assert!(task.step("missing").is_none());
        assert!(!task.is_complete());
        assert!(task.uses_remote());
    }

    #[test]
    fn test_plan() {
        let plan = sample().plan(&HashMap::new());

        assert_eq!(plan[0].command, "write ~/.transifexrc if missing");
        assert_eq!(plan[1].target, Some(Target::Remote));
        assert_eq!(plan[1].command, "(cd /srv/app) git pull origin master");
    }

    #[test]
    fn test_local_only_task() {
        let task = Task::new("local", "").with_step(Step::shell("tx", ShellCommand::local("tx pull")));
        assert!(!task.uses_remote());
    }
}
