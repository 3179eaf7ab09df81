//! Remote host addressing

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default SSH port
pub const DEFAULT_SSH_PORT: u16 = 22;

/// A remote target in `[user@]host[:port]` form
///
/// IPv6 addresses are written bare (`::1`, default port) or bracketed
/// when a port is given (`[::1]:2222`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HostSpec {
    /// Login user (ssh default when absent)
    pub user: Option<String>,

    /// Hostname or address
    pub host: String,

    /// SSH port
    pub port: u16,
}

impl HostSpec {
    /// The `user@host` destination passed to ssh
    pub fn destination(&self) -> String {
        match &self.user {
            Some(user) => format!("{}@{}", user, self.host),
            None => self.host.clone(),
        }
    }
}

impl FromStr for HostSpec {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            anyhow::bail!("Host specification is empty");
        }

        let (user, rest) = match s.split_once('@') {
            Some((user, rest)) => {
                if user.is_empty() {
                    anyhow::bail!("Host specification '{}' has an empty user", s);
                }
                (Some(user.to_string()), rest)
            }
            None => (None, s),
        };

        let parse_port = |port: &str| -> Result<u16> {
            port.parse()
                .map_err(|_| anyhow::anyhow!("Invalid port '{}' in host '{}'", port, s))
        };

        let (host, port) = if let Some(bracketed) = rest.strip_prefix('[') {
            let (host, after) = bracketed
                .split_once(']')
                .ok_or_else(|| anyhow::anyhow!("Unclosed '[' in host '{}'", s))?;
            let port = match after {
                "" => DEFAULT_SSH_PORT,
                _ => match after.strip_prefix(':') {
                    Some(port) => parse_port(port)?,
                    None => anyhow::bail!("Unexpected '{}' after ']' in host '{}'", after, s),
                },
            };
            (host, port)
        } else if rest.matches(':').count() > 1 {
            (rest, DEFAULT_SSH_PORT)
        } else {
            match rest.rsplit_once(':') {
                Some((host, port)) => (host, parse_port(port)?),
                None => (rest, DEFAULT_SSH_PORT),
            }
        };

        if host.is_empty() {
            anyhow::bail!("Host specification '{}' has an empty hostname", s);
        }

        Ok(Self {
            user,
            host: host.to_string(),
            port,
        })
    }
}

impl TryFrom<String> for HostSpec {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<HostSpec> for String {
    fn from(spec: HostSpec) -> Self {
        spec.to_string()
    }
}

impl fmt::Display for HostSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.port == DEFAULT_SSH_PORT {
            return write!(f, "{}", self.destination());
        }
        if let Some(user) = &self.user {
            write!(f, "{}@", user)?;
        }
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}
