//! Deployment configuration from YAML and the environment

use crate::core::{environment::Environment, host::HostSpec};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable naming the project checkout on the remote host
pub const PROJECT_DIR_VAR: &str = "PROJECT_DIR";
/// Environment variable naming the Django project package
pub const PROJECT_NAME_VAR: &str = "PROJECT_NAME";
/// Environment variable naming the virtualenv under `~/.virtualenvs`
pub const VIRTUALENV_NAME_VAR: &str = "VIRTUALENV_NAME";
/// Environment variable naming the supervisor program to restart
pub const SUPERVISOR_NAME_VAR: &str = "SUPERVISOR_NAME";
/// Environment variable naming the remote host
pub const DEPLOY_HOST_VAR: &str = "DEPLOY_HOST";

/// Top-level configuration for a run
///
/// Loaded from built-in defaults, then an optional YAML file, then the
/// environment. Treated as immutable once a task is built from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    /// Project checkout on the remote host
    pub project_dir: String,

    /// Django project package inside `project_dir`
    pub project_name: String,

    /// Virtualenv name under `~/.virtualenvs`
    pub virtualenv_name: String,

    /// Supervisor program name
    pub supervisor_name: String,

    /// Remote target for deploy tasks
    pub host: Option<HostSpec>,

    /// Forward the local SSH agent to the remote host
    pub forward_agent: bool,

    /// Git remote pulled during deploy
    pub git_remote: String,

    /// Branch pulled during deploy
    pub deploy_branch: String,

    /// Requirements file relative to `project_dir`
    pub requirements_file: String,

    /// Web server service restarted after the supervisor program
    pub web_server: String,

    /// Local directory holding `manage.py` and the tx config
    pub translations_dir: String,

    /// Local catalog directory committed by the CI pull task
    pub locale_dir: String,

    /// Upper bound for a single command, in seconds
    pub command_timeout_secs: u64,

    /// CI integration settings
    pub ci: CiConfig,
}

/// Settings for the CI translation-sync tasks
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CiConfig {
    /// Branch that pushes source strings
    pub main_branch: String,

    /// Branch that pulls and commits translations
    pub translation_branch: String,

    /// Commit message for pulled translations
    pub commit_message: String,

    /// Git identity used for the translation commit
    pub git_user_name: String,
    pub git_user_email: String,

    /// Transifex host written into `~/.transifexrc`
    pub transifex_hostname: String,

    /// Transifex account written into `~/.transifexrc`
    pub transifex_username: String,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            project_dir: String::new(),
            project_name: String::new(),
            virtualenv_name: String::new(),
            supervisor_name: String::new(),
            host: None,
            forward_agent: true,
            git_remote: "origin".to_string(),
            deploy_branch: "master".to_string(),
            requirements_file: "requirements/production.txt".to_string(),
            web_server: "nginx".to_string(),
            translations_dir: "src".to_string(),
            locale_dir: "src/locale/".to_string(),
            command_timeout_secs: 1800,
            ci: CiConfig::default(),
        }
    }
}

impl Default for CiConfig {
    fn default() -> Self {
        Self {
            main_branch: "master".to_string(),
            translation_branch: "travis-tx-commit".to_string(),
            commit_message: "Update translations [skip travis]".to_string(),
            git_user_name: "Travis CI".to_string(),
            git_user_email: "travis-ci@pycon.tw".to_string(),
            transifex_hostname: "https://www.transifex.com".to_string(),
            transifex_username: "pycontw".to_string(),
        }
    }
}

impl DeployConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: DeployConfig =
            serde_yaml::from_str(yaml).context("Failed to parse configuration YAML")?;
        Ok(config)
    }

    /// Resolve the configuration for a run: defaults, optional file, environment
    pub fn load(path: Option<&Path>, env: &Environment) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(env)?;
        Ok(config)
    }

    /// Override fields from environment variables that are set and non-empty
    pub fn apply_env(&mut self, env: &Environment) -> Result<()> {
        if let Some(v) = env.get_non_empty(PROJECT_DIR_VAR) {
            self.project_dir = v.to_string();
        }
        if let Some(v) = env.get_non_empty(PROJECT_NAME_VAR) {
            self.project_name = v.to_string();
        }
        if let Some(v) = env.get_non_empty(VIRTUALENV_NAME_VAR) {
            self.virtualenv_name = v.to_string();
        }
        if let Some(v) = env.get_non_empty(SUPERVISOR_NAME_VAR) {
            self.supervisor_name = v.to_string();
        }
        if let Some(v) = env.get_non_empty(DEPLOY_HOST_VAR) {
            let host = v
                .parse()
                .with_context(|| format!("Invalid {} value", DEPLOY_HOST_VAR))?;
            self.host = Some(host);
        }
        Ok(())
    }

    /// Directory holding `manage.py` on the remote host
    pub fn django_dir(&self) -> String {
        format!("{}/{}", self.project_dir, self.project_name)
    }

    /// Path to an executable inside the project virtualenv
    pub fn venv_bin(&self, tool: &str) -> String {
        format!("~/.virtualenvs/{}/bin/{}", self.virtualenv_name, tool)
    }

    /// Check that everything the remote deploy tasks need is present
    pub fn validate_remote(&self) -> Result<()> {
        let required = [
            (PROJECT_DIR_VAR, &self.project_dir),
            (PROJECT_NAME_VAR, &self.project_name),
            (VIRTUALENV_NAME_VAR, &self.virtualenv_name),
            (SUPERVISOR_NAME_VAR, &self.supervisor_name),
        ];

        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();

        if !missing.is_empty() {
            anyhow::bail!("Missing required settings: {}", missing.join(", "));
        }

        if self.host.is_none() {
            anyhow::bail!(
                "No remote host configured (set {}, `host:` in the config file, or --host)",
                DEPLOY_HOST_VAR
            );
        }

        if self.command_timeout_secs == 0 {
            anyhow::bail!("command_timeout_secs must be greater than zero");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deploy_env() -> Environment {
        Environment::from_pairs([
            (PROJECT_DIR_VAR, "/srv/pycontw"),
            (PROJECT_NAME_VAR, "src"),
            (VIRTUALENV_NAME_VAR, "pycontw"),
            (SUPERVISOR_NAME_VAR, "pycontw-web"),
            (DEPLOY_HOST_VAR, "deploy@pycon.tw"),
        ])
    }

    #[test]
    fn test_defaults() {
        let config = DeployConfig::default();
        assert!(config.forward_agent);
        assert_eq!(config.git_remote, "origin");
        assert_eq!(config.deploy_branch, "master");
        assert_eq!(config.ci.translation_branch, "travis-tx-commit");
        assert!(config.host.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let config = DeployConfig::load(None, &deploy_env()).unwrap();

        assert_eq!(config.project_dir, "/srv/pycontw");
        assert_eq!(config.django_dir(), "/srv/pycontw/src");
        assert_eq!(config.venv_bin("pip"), "~/.virtualenvs/pycontw/bin/pip");
        assert_eq!(config.host.as_ref().unwrap().host, "pycon.tw");
        assert!(config.validate_remote().is_ok());
    }

    #[test]
    fn test_empty_env_value_does_not_override() {
        let mut config = DeployConfig::from_yaml("project_dir: /opt/app\n").unwrap();
        config
            .apply_env(&Environment::from_pairs([(PROJECT_DIR_VAR, "")]))
            .unwrap();
        assert_eq!(config.project_dir, "/opt/app");
    }

    #[test]
    fn test_yaml_partial_keeps_defaults() {
        let yaml = r#"
project_dir: /srv/app
host: "www@example.org:2200"
ci:
  main_branch: main
"#;
        let config = DeployConfig::from_yaml(yaml).unwrap();

        assert_eq!(config.project_dir, "/srv/app");
        assert_eq!(config.host.as_ref().unwrap().port, 2200);
        assert_eq!(config.ci.main_branch, "main");
        assert_eq!(config.ci.translation_branch, "travis-tx-commit");
        assert_eq!(config.web_server, "nginx");
    }

    #[test]
    fn test_yaml_invalid_host_fails() {
        let result = DeployConfig::from_yaml("host: \"user@\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_reports_missing_fields() {
        let env = Environment::from_pairs([(PROJECT_DIR_VAR, "/srv/app")]);
        let config = DeployConfig::load(None, &env).unwrap();

        let err = config.validate_remote().unwrap_err().to_string();
        assert!(err.contains(PROJECT_NAME_VAR));
        assert!(err.contains(SUPERVISOR_NAME_VAR));
        assert!(!err.contains(PROJECT_DIR_VAR));
    }

    #[test]
    fn test_validate_requires_host() {
        let env = Environment::from_pairs([
            (PROJECT_DIR_VAR, "/srv/app"),
            (PROJECT_NAME_VAR, "src"),
            (VIRTUALENV_NAME_VAR, "app"),
            (SUPERVISOR_NAME_VAR, "app"),
        ]);
        let config = DeployConfig::load(None, &env).unwrap();

        let err = config.validate_remote().unwrap_err().to_string();
        assert!(err.contains("No remote host"));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shipline.yaml");
        std::fs::write(&path, "virtualenv_name: site\nforward_agent: false\n").unwrap();

        let config = DeployConfig::from_file(&path).unwrap();
        assert_eq!(config.virtualenv_name, "site");
        assert!(!config.forward_agent);
    }

    #[test]
    fn test_from_missing_file_fails() {
        let result = DeployConfig::from_file("/nonexistent/shipline-12345.yaml");
        assert!(result.is_err());
    }
}
