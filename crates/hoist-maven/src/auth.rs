//! Repository credentials.
//!
//! Credential lookup is a capability injected into the publisher through
//! [`CredentialProvider`]. Resolved material is wrapped in
//! [`SecretString`] so it never shows up in `Debug` output or logs, and it
//! is only ever attached to outgoing requests.
//!
//! The environment provider reads, for a repository named `vintageforge`:
//!
//! ```text
//! HOIST_VINTAGEFORGE_USERNAME / HOIST_VINTAGEFORGE_PASSWORD   (basic)
//! HOIST_VINTAGEFORGE_TOKEN                                    (bearer)
//! ```
//!
//! first from `.hoist.env`, then from the process environment.

use std::collections::BTreeMap;

use async_trait::async_trait;
use hoist_core::config::AuthMode;
use hoist_util::errors::HoistError;
use reqwest::RequestBuilder;
use secrecy::{ExposeSecret, SecretString};

use crate::repository::RepositoryTarget;

/// Credential material for one publish operation.
#[derive(Debug)]
pub enum Credentials {
    Anonymous,
    Basic {
        username: String,
        password: SecretString,
    },
    Bearer {
        token: SecretString,
    },
}

impl Credentials {
    /// Short description safe for logs.
    pub fn describe(&self) -> String {
        match self {
            Credentials::Anonymous => "anonymous".to_string(),
            Credentials::Basic { username, .. } => format!("basic auth as '{username}'"),
            Credentials::Bearer { .. } => "bearer token".to_string(),
        }
    }
}

/// Resolves credentials for a repository target.
///
/// Called once per publish operation; the result is shared by every upload.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn resolve(&self, target: &RepositoryTarget) -> Result<Credentials, HoistError>;
}

/// Reads `HOIST_<REPO>_*` variables from `.hoist.env` overrides and the
/// process environment.
#[derive(Debug, Default)]
pub struct EnvCredentialProvider {
    overrides: BTreeMap<String, String>,
}

impl EnvCredentialProvider {
    pub fn new(overrides: BTreeMap<String, String>) -> Self {
        Self { overrides }
    }

    fn var(&self, key: &str) -> Option<String> {
        hoist_core::properties::lookup(key, &self.overrides).filter(|v| !v.is_empty())
    }
}

#[async_trait]
impl CredentialProvider for EnvCredentialProvider {
    async fn resolve(&self, target: &RepositoryTarget) -> Result<Credentials, HoistError> {
        let prefix = env_prefix(&target.name);
        let material = Material {
            username: self.var(&format!("{prefix}_USERNAME")),
            password: self.var(&format!("{prefix}_PASSWORD")),
            token: self.var(&format!("{prefix}_TOKEN")),
            source: format!("{prefix}_USERNAME / {prefix}_PASSWORD / {prefix}_TOKEN"),
        };
        material.into_credentials(target)
    }
}

/// Credentials given explicitly, e.g. inline in `[repositories]` after
/// `${env:...}` interpolation.
pub struct StaticCredentialProvider {
    username: Option<String>,
    password: Option<String>,
    token: Option<String>,
}

impl StaticCredentialProvider {
    pub fn new(username: Option<String>, password: Option<String>, token: Option<String>) -> Self {
        let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());
        Self {
            username: non_empty(username),
            password: non_empty(password),
            token: non_empty(token),
        }
    }

    pub fn basic(username: &str, password: &str) -> Self {
        Self::new(Some(username.to_string()), Some(password.to_string()), None)
    }

    pub fn anonymous() -> Self {
        Self::new(None, None, None)
    }
}

impl std::fmt::Debug for StaticCredentialProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentialProvider")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentialProvider {
    async fn resolve(&self, target: &RepositoryTarget) -> Result<Credentials, HoistError> {
        Material {
            username: self.username.clone(),
            password: self.password.clone(),
            token: self.token.clone(),
            source: format!("[repositories.{}] username / password / token", target.name),
        }
        .into_credentials(target)
    }
}

struct Material {
    username: Option<String>,
    password: Option<String>,
    token: Option<String>,
    source: String,
}

impl Material {
    fn into_credentials(self, target: &RepositoryTarget) -> Result<Credentials, HoistError> {
        let missing = |what: &str| HoistError::Authentication {
            repository: target.name.clone(),
            message: format!(
                "{what} required by auth = \"{}\" not found in {}",
                mode_name(target.auth),
                self.source
            ),
        };
        let secret = |s: String| SecretString::new(s.into());

        match target.auth {
            AuthMode::None => Ok(Credentials::Anonymous),
            AuthMode::Basic => match (self.username.clone(), self.password.clone()) {
                (Some(username), Some(password)) => Ok(Credentials::Basic {
                    username,
                    password: secret(password),
                }),
                (Some(_), None) => Err(missing("password")),
                _ => Err(missing("username and password")),
            },
            AuthMode::Bearer => match self.token.clone() {
                Some(token) => Ok(Credentials::Bearer { token: secret(token) }),
                None => Err(missing("token")),
            },
            AuthMode::Auto => match (
                self.username.clone(),
                self.password.clone(),
                self.token.clone(),
            ) {
                (Some(username), Some(password), _) => Ok(Credentials::Basic {
                    username,
                    password: secret(password),
                }),
                (Some(_), None, _) => Err(HoistError::Authentication {
                    repository: target.name.clone(),
                    message: format!("username is set but password is missing ({})", self.source),
                }),
                (None, _, Some(token)) => Ok(Credentials::Bearer { token: secret(token) }),
                (None, _, None) => Ok(Credentials::Anonymous),
            },
        }
    }
}

fn mode_name(mode: AuthMode) -> &'static str {
    match mode {
        AuthMode::Auto => "auto",
        AuthMode::None => "none",
        AuthMode::Basic => "basic",
        AuthMode::Bearer => "bearer",
    }
}

/// `HOIST_` plus the repository name upper-cased with non-alphanumerics
/// replaced by `_`: `vintage-forge` becomes `HOIST_VINTAGE_FORGE`.
pub fn env_prefix(repository: &str) -> String {
    let name: String = repository
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("HOIST_{name}")
}

/// Attach credentials to a request.
pub fn apply_auth(request: RequestBuilder, credentials: &Credentials) -> RequestBuilder {
    match credentials {
        Credentials::Anonymous => request,
        Credentials::Basic { username, password } => {
            request.basic_auth(username, Some(password.expose_secret()))
        }
        Credentials::Bearer { token } => request.bearer_auth(token.expose_secret()),
    }
}
