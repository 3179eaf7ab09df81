//! Execution state models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Overall task execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    /// Task has not started
    Pending,
    /// Task is currently running
    Running,
    /// Task finished all its steps, or ended early through a `Finish` step
    Completed,
    /// A step failed and stopped the task
    Failed,
    /// The branch guard declined to run the task
    Skipped,
}

impl ExecutionStatus {
    /// Whether the process should exit with success
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionStatus::Completed | ExecutionStatus::Skipped)
    }

    /// Process exit code for a finished task
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}

/// State of a single step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StepState {
    /// Step has not run yet
    Pending,
    /// Step is currently running
    Running {
        started_at: DateTime<Utc>,
    },
    /// Step exited with status zero
    Completed {
        output: String,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    },
    /// Step failed but its policy let the task go on
    Tolerated {
        exit_code: i32,
        error: String,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    },
    /// Step failed and stopped the task
    Failed {
        error: String,
        exit_code: Option<i32>,
        started_at: DateTime<Utc>,
        failed_at: DateTime<Utc>,
    },
    /// Step never ran
    Skipped {
        reason: String,
    },
}

impl StepState {
    /// Check if step is in a terminal state
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StepState::Pending | StepState::Running { .. })
    }
}

/// Overall task state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskState {
    /// Unique run ID
    pub run_id: Uuid,

    /// Current execution status
    pub status: ExecutionStatus,

    /// When execution started
    pub started_at: Option<DateTime<Utc>>,

    /// When execution completed/failed
    pub completed_at: Option<DateTime<Utc>>,

    /// Total number of steps
    pub total_steps: usize,

    /// Steps that exited successfully
    pub completed_steps: usize,

    /// Steps that failed without stopping the task
    pub tolerated_steps: usize,
}

impl TaskState {
    /// Create a new task state
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            status: ExecutionStatus::Pending,
            started_at: None,
            completed_at: None,
            total_steps: 0,
            completed_steps: 0,
            tolerated_steps: 0,
        }
    }

    /// Mark task as started
    pub fn start(&mut self, total_steps: usize) {
        self.status = ExecutionStatus::Running;
        self.started_at = Some(Utc::now());
        self.total_steps = total_steps;
    }

    /// Mark task as completed
    pub fn complete(&mut self) {
        self.finish(ExecutionStatus::Completed);
    }

    /// Mark task as failed
    pub fn fail(&mut self) {
        self.finish(ExecutionStatus::Failed);
    }

    /// Mark task as skipped by its guard
    pub fn skip(&mut self) {
        self.finish(ExecutionStatus::Skipped);
    }

    fn finish(&mut self, status: ExecutionStatus) {
        self.status = status;
        self.completed_at = Some(Utc::now());
    }

    /// Fraction of steps that ran, from 0.0 to 1.0
    pub fn progress(&self) -> f64 {
        if self.total_steps == 0 {
            return 0.0;
        }
        (self.completed_steps + self.tolerated_steps) as f64 / self.total_steps as f64
    }
}

impl Default for TaskState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_state_lifecycle() {
        let mut state = TaskState::new();
        assert_eq!(state.status, ExecutionStatus::Pending);

        state.start(4);
        assert_eq!(state.status, ExecutionStatus::Running);
        assert!(state.started_at.is_some());

        state.completed_steps = 1;
        state.tolerated_steps = 1;
        assert_eq!(state.progress(), 0.5);

        state.complete();
        assert_eq!(state.status, ExecutionStatus::Completed);
        assert!(state.completed_at.is_some());
    }

    #[test]
    fn test_progress_with_no_steps() {
        let state = TaskState::new();
        assert_eq!(state.progress(), 0.0);
    }

    #[test]
    fn test_success_statuses() {
        assert!(ExecutionStatus::Completed.is_success());
        assert!(ExecutionStatus::Skipped.is_success());
        assert!(!ExecutionStatus::Failed.is_success());
        assert!(!ExecutionStatus::Running.is_success());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExecutionStatus::Completed.exit_code(), 0);
        assert_eq!(ExecutionStatus::Skipped.exit_code(), 0);
        assert_eq!(ExecutionStatus::Failed.exit_code(), 1);
        assert_eq!(ExecutionStatus::Pending.exit_code(), 1);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!StepState::Pending.is_terminal());
        assert!(!StepState::Running { started_at: Utc::now() }.is_terminal());
        assert!(StepState::Skipped { reason: "x".to_string() }.is_terminal());
    }
}
