//! Shell command model

use crate::shell::quote;
use regex::{Captures, Regex};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

/// Matches `{{ name }}` with any inner spacing, capturing the name
pub(crate) fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z0-9_.]+)\s*\}\}").expect("placeholder regex is valid")
    })
}

/// Where a command runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    /// On the machine running shipline
    Local,
    /// On the configured remote host over ssh
    Remote,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Local => write!(f, "local"),
            Target::Remote => write!(f, "remote"),
        }
    }
}

/// What a non-zero exit does to the rest of the task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OnFailure {
    /// Stop the task and mark it failed
    #[default]
    Abort,
    /// Log the failure and run the next step
    Continue,
    /// Log the failure and end the task successfully, skipping later steps
    Finish,
}

/// A command line to run as one task step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShellCommand {
    pub target: Target,

    /// Command line, may contain `{{ name }}` placeholders
    pub line: String,

    /// Working directory (`cd` on the remote side, process cwd locally)
    pub cwd: Option<String>,

    /// Run through sudo (remote only)
    pub sudo: bool,

    /// Store trimmed stdout under this variable name
    pub capture: Option<String>,

    pub on_failure: OnFailure,
}

impl ShellCommand {
    /// A command on the remote host
    pub fn remote(line: impl Into<String>) -> Self {
        Self {
            target: Target::Remote,
            line: line.into(),
            cwd: None,
            sudo: false,
            capture: None,
            on_failure: OnFailure::Abort,
        }
    }

    /// A command on the local machine
    pub fn local(line: impl Into<String>) -> Self {
        Self {
            target: Target::Local,
            ..Self::remote(line)
        }
    }

    pub fn in_dir(mut self, dir: impl Into<String>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn with_sudo(mut self) -> Self {
        self.sudo = true;
        self
    }

    pub fn capture_as(mut self, name: impl Into<String>) -> Self {
        self.capture = Some(name.into());
        self
    }

    pub fn on_failure(mut self, policy: OnFailure) -> Self {
        self.on_failure = policy;
        self
    }

    /// Substitute `{{ name }}` placeholders; unknown names are left in place
    pub fn render(&self, variables: &HashMap<String, String>) -> RenderedCommand {
        let line = placeholder_regex()
            .replace_all(&self.line, |caps: &Captures| match variables.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned();

        RenderedCommand {
            target: self.target,
            line,
            cwd: self.cwd.clone(),
            sudo: self.sudo,
        }
    }
}

/// A command with all placeholders resolved, ready for a runner
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedCommand {
    pub target: Target,
    pub line: String,
    pub cwd: Option<String>,
    pub sudo: bool,
}

impl RenderedCommand {
    /// The string handed to the remote login shell
    ///
    /// `cd <dir> && <line>` wrapped in `/bin/bash -l -c`, prefixed with
    /// `sudo -H` when requested. `~` inside the line is expanded by the
    /// remote bash.
    pub fn remote_invocation(&self) -> String {
        let inner = match &self.cwd {
            Some(dir) => format!("cd {} && {}", quote::quote_path(dir), self.line),
            None => self.line.clone(),
        };
        let shell = format!("/bin/bash -l -c {}", quote::escape_command_for_shell(&inner));
        if self.sudo {
            format!("sudo -H {}", shell)
        } else {
            shell
        }
    }
}

impl fmt::Display for RenderedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sudo {
            write!(f, "sudo ")?;
        }
        match &self.cwd {
            Some(dir) => write!(f, "(cd {}) {}", dir, self.line),
            None => write!(f, "{}", self.line),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let cmd = ShellCommand::local("git commit -m msg")
            .in_dir("src")
            .capture_as("out")
            .on_failure(OnFailure::Finish);

        assert_eq!(cmd.target, Target::Local);
        assert_eq!(cmd.cwd.as_deref(), Some("src"));
        assert_eq!(cmd.capture.as_deref(), Some("out"));
        assert_eq!(cmd.on_failure, OnFailure::Finish);
        assert!(!cmd.sudo);
    }

    #[test]
    fn test_render_placeholders() {
        let cmd = ShellCommand::local("git push {{ remote }} {{ ci_branch }}");
        let mut vars = HashMap::new();
        vars.insert("remote".to_string(), "origin".to_string());
        vars.insert("ci_branch".to_string(), "travis-tx-commit".to_string());

        let rendered = cmd.render(&vars);
        assert_eq!(rendered.line, "git push origin travis-tx-commit");
    }

    #[test]
    fn test_render_ignores_placeholder_spacing() {
        let mut vars = HashMap::new();
        vars.insert("ci_branch".to_string(), "master".to_string());

        let rendered = ShellCommand::local("git push {{ci_branch}} {{  remote}}").render(&vars);
        assert_eq!(rendered.line, "git push master {{  remote}}");
        assert_eq!(
            crate::core::context::unresolved_placeholders(&rendered.line),
            vec!["remote".to_string()]
        );
    }

    #[test]
    fn test_remote_invocation_with_cwd() {
        let rendered = ShellCommand::remote("git pull origin master")
            .in_dir("/srv/app")
            .render(&HashMap::new());

        assert_eq!(
            rendered.remote_invocation(),
            "/bin/bash -l -c 'cd '\\''/srv/app'\\'' && git pull origin master'"
        );
    }

    #[test]
    fn test_remote_invocation_sudo() {
        let rendered = ShellCommand::remote("service nginx restart")
            .with_sudo()
            .render(&HashMap::new());

        assert_eq!(
            rendered.remote_invocation(),
            "sudo -H /bin/bash -l -c 'service nginx restart'"
        );
        assert_eq!(rendered.to_string(), "sudo service nginx restart");
    }

    #[test]
    fn test_display_with_cwd() {
        let rendered = ShellCommand::local("tx pull").in_dir("src").render(&HashMap::new());
        assert_eq!(rendered.to_string(), "(cd src) tx pull");
    }
}
