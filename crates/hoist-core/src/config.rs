use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use hoist_util::errors::HoistError;

use crate::artifact::{Artifact, ArtifactSet};
use crate::descriptor::DescriptorConfig;

/// The parsed representation of a `Hoist.toml` file.
///
/// Descriptor sections (`[module]`, `[parent]`, `[dependencies]`,
/// `[[licenses]]`, ...) sit at the top level next to the publishing
/// sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(flatten)]
    pub descriptor: DescriptorConfig,

    #[serde(default)]
    pub artifacts: ArtifactsConfig,

    #[serde(default)]
    pub repositories: BTreeMap<String, RepositoryEntry>,

    #[serde(default)]
    pub publish: PublishSettings,
}

/// Paths to already-built files from `[artifacts]`.
///
/// `primary` is the main binary; every other key is a classifier.
///
/// ```toml
/// [artifacts]
/// primary = "build/libs/asm-deprecated-9.9.jar"
/// sources = "build/libs/asm-deprecated-9.9-sources.jar"
/// javadoc = "build/libs/asm-deprecated-9.9-javadoc.jar"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArtifactsConfig {
    #[serde(default)]
    pub primary: Option<PathBuf>,
    #[serde(flatten)]
    pub classified: BTreeMap<String, PathBuf>,
}

/// A repository reference, either a URL string or a detailed configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RepositoryEntry {
    Url(String),
    Detailed {
        url: String,
        #[serde(default)]
        auth: AuthMode,
        #[serde(default)]
        username: Option<String>,
        #[serde(default)]
        password: Option<String>,
        #[serde(default)]
        token: Option<String>,
    },
}

impl RepositoryEntry {
    pub fn url(&self) -> &str {
        match self {
            RepositoryEntry::Url(url) => url,
            RepositoryEntry::Detailed { url, .. } => url,
        }
    }
}

/// How a repository expects uploads to authenticate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// Use credentials when some are configured, otherwise upload anonymously.
    #[default]
    Auto,
    /// Never send credentials.
    None,
    /// HTTP basic authentication; username and password are required.
    Basic,
    /// Bearer token; a token is required.
    Bearer,
}

/// Publishing behaviour from `[publish]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PublishSettings {
    /// Repository used when `--repository` is not given.
    #[serde(default)]
    pub repository: Option<String>,
    /// Maximum number of concurrent uploads.
    #[serde(default = "default_jobs")]
    pub jobs: usize,
    /// Upload `.md5`/`.sha1`/`.sha256`/`.sha512` sidecars.
    #[serde(default = "default_true")]
    pub checksums: bool,
    /// Merge the published version into `maven-metadata.xml`.
    #[serde(default = "default_true")]
    pub update_metadata: bool,
    /// Per-request timeout for HTTP uploads.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for PublishSettings {
    fn default() -> Self {
        Self {
            repository: None,
            jobs: default_jobs(),
            checksums: true,
            update_metadata: true,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_jobs() -> usize {
    4
}

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    120
}

impl ProjectConfig {
    /// Load and parse a `Hoist.toml` file from the given path.
    ///
    /// `${env:VAR}` references are resolved after parsing, inside string
    /// values only, using `.hoist.env` (if present alongside `Hoist.toml`)
    /// and process environment variables. Parse and schema errors therefore
    /// only ever show the unresolved file content.
    pub fn from_path(path: &Path) -> miette::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| HoistError::Config {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;

        let dir = path.parent().unwrap_or(Path::new("."));
        let env_vars = crate::properties::load_env_file(&dir.join(crate::ENV_FILE))?;
        Self::from_str_with_env(&content, &env_vars)
    }

    /// Parse `content`, then resolve `${env:VAR}` references in its string
    /// values against `env_vars` and the process environment.
    pub fn from_str_with_env(
        content: &str,
        env_vars: &BTreeMap<String, String>,
    ) -> miette::Result<Self> {
        let raw: toml::Table = content.parse().map_err(parse_error)?;
        // Surface structural problems against the file as written.
        toml::Value::Table(raw.clone())
            .try_into::<Self>()
            .map_err(parse_error)?;

        let mut resolved = toml::Value::Table(raw);
        crate::properties::interpolate_strings(&mut resolved, env_vars);
        resolved.try_into().map_err(|_| {
            HoistError::Config {
                message: "Hoist.toml is invalid once ${env:...} references are resolved"
                    .to_string(),
            }
            .into()
        })
    }

    /// Parse a `Hoist.toml` from a string (no interpolation).
    pub fn from_str(content: &str) -> miette::Result<Self> {
        toml::from_str(content).map_err(parse_error)
    }

    /// Pick the repository to publish to: the explicit `name`, else
    /// `[publish] repository`, else the only configured repository.
    pub fn select_repository(&self, name: Option<&str>) -> miette::Result<(&str, &RepositoryEntry)> {
        let wanted = name.or(self.publish.repository.as_deref());
        match wanted {
            Some(wanted) => self
                .repositories
                .get_key_value(wanted)
                .map(|(k, v)| (k.as_str(), v))
                .ok_or_else(|| {
                    HoistError::Config {
                        message: format!("No repository named '{wanted}' in [repositories]"),
                    }
                    .into()
                }),
            None => {
                let mut iter = self.repositories.iter();
                match (iter.next(), iter.next()) {
                    (Some((k, v)), None) => Ok((k.as_str(), v)),
                    (None, _) => Err(HoistError::Config {
                        message: "No repositories configured in [repositories]".to_string(),
                    }
                    .into()),
                    _ => Err(HoistError::Config {
                        message: "Several repositories configured; pass --repository or set \
                                  [publish] repository"
                            .to_string(),
                    }
                    .into()),
                }
            }
        }
    }

    /// Read every configured artifact from disk, relative to `root`.
    ///
    /// The extension is taken from each file name, defaulting to the
    /// module's packaging.
    pub fn load_artifacts(&self, root: &Path) -> miette::Result<ArtifactSet> {
        let default_ext = self
            .descriptor
            .module
            .packaging
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(crate::descriptor::DEFAULT_PACKAGING);

        let mut set = ArtifactSet::new();
        let entries = self
            .artifacts
            .primary
            .iter()
            .map(|p| ("", p))
            .chain(self.artifacts.classified.iter().map(|(k, p)| (k.as_str(), p)));

        for (classifier, rel) in entries {
            let path = root.join(rel);
            let data = std::fs::read(&path).map_err(|e| HoistError::Validation {
                message: format!("Cannot read artifact {}: {e}", path.display()),
            })?;
            let extension = path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or(default_ext)
                .to_string();
            tracing::debug!(
                "Loaded artifact {} ({} bytes) from {}",
                if classifier.is_empty() { "primary" } else { classifier },
                data.len(),
                path.display()
            );
            set.insert(Artifact {
                classifier: classifier.to_string(),
                extension,
                data,
            })?;
        }
        Ok(set)
    }
}

fn parse_error(e: toml::de::Error) -> miette::Report {
    HoistError::Config {
        message: format!("Failed to parse Hoist.toml: {e}"),
    }
    .into()
}
