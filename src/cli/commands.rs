//! CLI command definitions

use crate::tasks::{TaskName, TaskOptions};
use clap::Args;

/// Run a task
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Task to run
    #[arg(value_enum)]
    pub task: TaskArg,

    /// Print commands instead of running them
    #[arg(long)]
    pub dry_run: bool,

    /// push-translations: don't push source strings
    #[arg(long)]
    pub no_source: bool,

    /// push-translations: don't push translated strings
    #[arg(long)]
    pub no_translation: bool,
}

impl RunCommand {
    pub fn options(&self) -> TaskOptions {
        TaskOptions {
            source: !self.no_source,
            translation: !self.no_translation,
        }
    }
}

/// Show the commands a task would run
#[derive(Debug, Args, Clone)]
pub struct PlanCommand {
    /// Task to describe
    #[arg(value_enum)]
    pub task: TaskArg,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// List available tasks
#[derive(Debug, Args, Clone)]
pub struct ListCommand {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Check the configuration
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Only check this task
    #[arg(long, value_enum)]
    pub task: Option<TaskArg>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Task argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TaskArg {
    Deploy,
    UpgradeSystem,
    PullTranslations,
    PushTranslations,
    CiPushTranslations,
    CiPullTranslations,
}

impl From<TaskArg> for TaskName {
    fn from(arg: TaskArg) -> Self {
        match arg {
            TaskArg::Deploy => TaskName::Deploy,
            TaskArg::UpgradeSystem => TaskName::UpgradeSystem,
            TaskArg::PullTranslations => TaskName::PullTranslations,
            TaskArg::PushTranslations => TaskName::PushTranslations,
            TaskArg::CiPushTranslations => TaskName::CiPushTranslations,
            TaskArg::CiPullTranslations => TaskName::CiPullTranslations,
        }
    }
}
