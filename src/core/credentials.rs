//! One-time credential file bootstrap for CI
//!
//! CI machines start without `~/.transifexrc` or `~/.netrc`. Before a
//! translation-sync task talks to Transifex or pushes to GitHub, the file
//! is written from secrets in the environment. An existing file is never
//! touched, and secrets are only required when the file has to be created.

use crate::core::{config::CiConfig, environment::Environment};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Secret holding the Transifex password
pub const TRANSIFEX_PASSWORD_VAR: &str = "TRANSIFEX_PASSWORD";
/// Secret holding the GitHub login
pub const GITHUB_USERNAME_VAR: &str = "GITHUB_USERNAME";
/// Secret holding the GitHub password or token
pub const GITHUB_PASSWORD_VAR: &str = "GITHUB_PASSWORD";

/// Errors while bootstrapping a credential file
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Environment variable {0} is required to write the credential file")]
    MissingSecret(String),

    #[error("Cannot determine the home directory")]
    NoHomeDir,

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What `ensure` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialStatus {
    Written,
    AlreadyPresent,
}

/// A file under the home directory rendered from environment secrets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialFile {
    /// Path relative to the home directory
    pub relative_path: PathBuf,

    /// File contents with `{{ VAR }}` placeholders for secrets
    pub template: String,

    /// Environment variables substituted into the template
    pub secrets: Vec<String>,
}

impl CredentialFile {
    /// `~/.transifexrc` for the `tx` client
    pub fn transifexrc(ci: &CiConfig) -> Self {
        let template = format!(
            "[{host}]\n\
             hostname = {host}\n\
             password = {{{{ {password} }}}}\n\
             token = \n\
             username = {user}\n",
            host = ci.transifex_hostname,
            password = TRANSIFEX_PASSWORD_VAR,
            user = ci.transifex_username,
        );

        Self {
            relative_path: PathBuf::from(".transifexrc"),
            template,
            secrets: vec![TRANSIFEX_PASSWORD_VAR.to_string()],
        }
    }

    /// `~/.netrc` so `git push` can authenticate against GitHub
    pub fn netrc() -> Self {
        let template = format!(
            "machine github.com\n    login {{{{ {} }}}}\n    password {{{{ {} }}}}\n",
            GITHUB_USERNAME_VAR, GITHUB_PASSWORD_VAR
        );

        Self {
            relative_path: PathBuf::from(".netrc"),
            template,
            secrets: vec![
                GITHUB_USERNAME_VAR.to_string(),
                GITHUB_PASSWORD_VAR.to_string(),
            ],
        }
    }

    /// Display form, e.g. `~/.netrc`
    pub fn display_path(&self) -> String {
        format!("~/{}", self.relative_path.display())
    }

    /// Fill the template from the environment
    pub fn render(&self, env: &Environment) -> Result<String, CredentialError> {
        let mut content = self.template.clone();
        for name in &self.secrets {
            let value = env
                .get(name)
                .ok_or_else(|| CredentialError::MissingSecret(name.clone()))?;
            let placeholder = format!("{{{{ {} }}}}", name);
            content = content.replace(&placeholder, value);
        }
        Ok(content)
    }

    /// Write the file under `home` unless it already exists
    pub fn ensure(
        &self,
        home: Option<&Path>,
        env: &Environment,
    ) -> Result<CredentialStatus, CredentialError> {
        let home = home.ok_or(CredentialError::NoHomeDir)?;
        let path = home.join(&self.relative_path);

        if path.exists() {
            return Ok(CredentialStatus::AlreadyPresent);
        }

        let content = self.render(env)?;

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = match options.open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Ok(CredentialStatus::AlreadyPresent);
            }
            Err(source) => return Err(CredentialError::Io { path, source }),
        };

        write_or_remove(&path, &mut file, content.as_bytes())
            .map_err(|source| CredentialError::Io { path, source })?;

        Ok(CredentialStatus::Written)
    }
}

/// Write `content` to a freshly created file, deleting it if the write fails
///
/// A half-written file would otherwise count as present on every later run.
fn write_or_remove(path: &Path, file: &mut impl Write, content: &[u8]) -> std::io::Result<()> {
    let result = file.write_all(content).and_then(|_| file.flush());
    if result.is_err() {
        if let Err(e) = std::fs::remove_file(path) {
            warn!("Could not remove incomplete {}: {}", path.display(), e);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secrets() -> Environment {
        Environment::from_pairs([
            (TRANSIFEX_PASSWORD_VAR, "tx-secret"),
            (GITHUB_USERNAME_VAR, "bot"),
            (GITHUB_PASSWORD_VAR, "gh-secret"),
        ])
    }

    #[test]
    fn test_transifexrc_content() {
        let file = CredentialFile::transifexrc(&CiConfig::default());
        let content = file.render(&secrets()).unwrap();

        assert_eq!(
            content,
            "[https://www.transifex.com]\n\
             hostname = https://www.transifex.com\n\
             password = tx-secret\n\
             token = \n\
             username = pycontw\n"
        );
    }

    #[test]
    fn test_netrc_content() {
        let content = CredentialFile::netrc().render(&secrets()).unwrap();
        assert_eq!(
            content,
            "machine github.com\n    login bot\n    password gh-secret\n"
        );
    }

    #[test]
    fn test_ensure_writes_once() {
        let home = tempfile::tempdir().unwrap();
        let file = CredentialFile::netrc();

        let status = file.ensure(Some(home.path()), &secrets()).unwrap();
        assert_eq!(status, CredentialStatus::Written);

        let written = std::fs::read_to_string(home.path().join(".netrc")).unwrap();
        assert!(written.contains("login bot"));

        let other = Environment::from_pairs([
            (GITHUB_USERNAME_VAR, "someone-else"),
            (GITHUB_PASSWORD_VAR, "x"),
        ]);
        let status = file.ensure(Some(home.path()), &other).unwrap();
        assert_eq!(status, CredentialStatus::AlreadyPresent);

        let unchanged = std::fs::read_to_string(home.path().join(".netrc")).unwrap();
        assert_eq!(written, unchanged);
    }

    #[test]
    fn test_existing_file_needs_no_secret() {
        let home = tempfile::tempdir().unwrap();
        std::fs::write(home.path().join(".transifexrc"), "already here").unwrap();

        let file = CredentialFile::transifexrc(&CiConfig::default());
        let status = file.ensure(Some(home.path()), &Environment::default()).unwrap();
        assert_eq!(status, CredentialStatus::AlreadyPresent);
    }

    #[test]
    fn test_missing_secret() {
        let home = tempfile::tempdir().unwrap();
        let file = CredentialFile::transifexrc(&CiConfig::default());

        let err = file
            .ensure(Some(home.path()), &Environment::default())
            .unwrap_err();
        assert!(matches!(err, CredentialError::MissingSecret(ref v) if v == TRANSIFEX_PASSWORD_VAR));
        assert!(!home.path().join(".transifexrc").exists());
    }

    #[test]
    fn test_no_home() {
        let file = CredentialFile::netrc();
        assert!(matches!(
            file.ensure(None, &secrets()),
            Err(CredentialError::NoHomeDir)
        ));
    }

    /// Writer whose every write fails
    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(ErrorKind::Other, "No space left on device"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_failed_write_removes_file() {
        let home = tempfile::tempdir().unwrap();
        let path = home.path().join(".netrc");
        std::fs::write(&path, "").unwrap();

        let result = write_or_remove(&path, &mut FailingWriter, b"machine github.com\n");
        assert!(result.is_err());
        assert!(!path.exists());

        // The next run writes the file again instead of trusting the leftover
        let status = CredentialFile::netrc().ensure(Some(home.path()), &secrets()).unwrap();
        assert_eq!(status, CredentialStatus::Written);
    }

    #[test]
    fn test_successful_write_keeps_file() {
        let home = tempfile::tempdir().unwrap();
        let path = home.path().join(".netrc");
        let mut file = std::fs::File::create(&path).unwrap();

        write_or_remove(&path, &mut file, b"machine github.com\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "machine github.com\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_written_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let home = tempfile::tempdir().unwrap();
        CredentialFile::netrc()
            .ensure(Some(home.path()), &secrets())
            .unwrap();

        let mode = std::fs::metadata(home.path().join(".netrc"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
