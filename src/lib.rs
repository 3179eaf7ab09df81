//! shipline - deploy and translation-sync tasks for a Django service

pub mod cli;
pub mod core;
pub mod execution;
pub mod shell;
pub mod tasks;

// Re-export commonly used types
pub use core::{config::DeployConfig, environment::Environment, ExecutionStatus, RunContext, Step, StepState, Task};
pub use execution::{ExecutionError, ExecutionEvent, TaskEngine};
pub use shell::{CommandOutput, CommandRunner, DryRunShell, LocalShell, ShellError, SshShell, SystemShell};
pub use tasks::{TaskName, TaskOptions};
