//! Run context - variables and outputs shared between steps

use crate::core::{command::placeholder_regex, environment::Environment, guard::CiEnvironment};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Variable holding the CI branch name for command templates
pub const CI_BRANCH_VARIABLE: &str = "ci_branch";

/// Execution context for a task run
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Variables available to command templates
    pub variables: HashMap<String, String>,

    /// Outputs from completed steps (step_id -> stdout)
    pub step_outputs: HashMap<String, String>,

    /// Environment snapshot taken at startup
    pub environment: Environment,

    /// CI build information derived from the environment
    pub ci: CiEnvironment,

    /// Home directory for credential files
    pub home_dir: Option<PathBuf>,
}

impl RunContext {
    /// Create a context from an environment snapshot
    pub fn new(environment: Environment) -> Self {
        let ci = CiEnvironment::from_env(&environment);

        let mut variables = HashMap::new();
        if let Some(branch) = &ci.branch {
            variables.insert(CI_BRANCH_VARIABLE.to_string(), branch.clone());
        }

        Self {
            variables,
            step_outputs: HashMap::new(),
            environment,
            ci,
            home_dir: dirs::home_dir(),
        }
    }

    /// Use a different home directory for credential files
    pub fn with_home_dir(mut self, home: impl Into<PathBuf>) -> Self {
        self.home_dir = Some(home.into());
        self
    }

    pub fn home_dir(&self) -> Option<&Path> {
        self.home_dir.as_deref()
    }

    /// Set a variable
    pub fn set_variable(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(key.into(), value.into());
    }

    /// Get a variable
    pub fn get_variable(&self, key: &str) -> Option<&String> {
        self.variables.get(key)
    }

    /// Set the output of a step
    pub fn set_step_output(&mut self, step_id: &str, output: String) {
        self.step_outputs.insert(step_id.to_string(), output);
    }

    /// All variables available for command rendering
    pub fn get_rendering_variables(&self) -> HashMap<String, String> {
        let mut vars = self.variables.clone();
        for (step_id, output) in &self.step_outputs {
            vars.insert(format!("steps.{}.output", step_id), output.trim().to_string());
        }
        vars
    }
}

/// Names of `{{ name }}` placeholders left in a rendered line
pub fn unresolved_placeholders(line: &str) -> Vec<String> {
    placeholder_regex()
        .captures_iter(line)
        .map(|caps| caps[1].to_string())
        .collect()
}
