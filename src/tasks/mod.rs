//! Task catalog
//!
//! Builds the runnable tasks from a `DeployConfig`.

pub mod ci;
pub mod deploy;
pub mod translations;

use crate::core::{config::DeployConfig, Task};
use anyhow::Result;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Every task shipline can run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskName {
    Deploy,
    UpgradeSystem,
    PullTranslations,
    PushTranslations,
    CiPushTranslations,
    CiPullTranslations,
}

/// Per-run switches for tasks that take arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskOptions {
    /// `push-translations`: push source strings
    pub source: bool,
    /// `push-translations`: push translated strings
    pub translation: bool,
}

impl Default for TaskOptions {
    fn default() -> Self {
        Self {
            source: true,
            translation: true,
        }
    }
}

impl TaskName {
    pub fn all() -> &'static [TaskName] {
        &[
            TaskName::Deploy,
            TaskName::UpgradeSystem,
            TaskName::PullTranslations,
            TaskName::PushTranslations,
            TaskName::CiPushTranslations,
            TaskName::CiPullTranslations,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskName::Deploy => "deploy",
            TaskName::UpgradeSystem => "upgrade-system",
            TaskName::PullTranslations => "pull-translations",
            TaskName::PushTranslations => "push-translations",
            TaskName::CiPushTranslations => "ci-push-translations",
            TaskName::CiPullTranslations => "ci-pull-translations",
        }
    }

    /// Whether the task talks to the remote host
    pub fn requires_remote(&self) -> bool {
        matches!(self, TaskName::Deploy | TaskName::UpgradeSystem)
    }

    /// Build the task from configuration
    pub fn build(&self, config: &DeployConfig, options: TaskOptions) -> Task {
        match self {
            TaskName::Deploy => deploy::deploy(config),
            TaskName::UpgradeSystem => deploy::upgrade_system(config),
            TaskName::PullTranslations => translations::pull_translations(config),
            TaskName::PushTranslations => {
                translations::push_translations(config, options.source, options.translation)
            }
            TaskName::CiPushTranslations => ci::ci_push_translations(config),
            TaskName::CiPullTranslations => ci::ci_pull_translations(config),
        }
    }

    /// Check that the configuration has what this task needs
    pub fn validate(&self, config: &DeployConfig) -> Result<()> {
        if self.requires_remote() {
            config.validate_remote()?;
        }
        Ok(())
    }
}

impl fmt::Display for TaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskName {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        TaskName::all()
            .iter()
            .copied()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = TaskName::all().iter().map(|n| n.as_str()).collect();
                anyhow::anyhow!("Unknown task '{}' (known: {})", s, known.join(", "))
            })
    }
}
