use serde::{Deserialize, Serialize};

use crate::identity::check_coordinate_part;
use crate::version;

/// A dependency declaration in Hoist.toml.
///
/// Supports both shorthand (`"group:artifact:version"`) and detailed forms.
/// The shorthand form uses the `implementation` scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependencySpec {
    Short(String),
    Detailed(DetailedDependency),
}

/// A dependency with explicit group, artifact, version, and scope.
///
/// `version` is optional here so that a missing version surfaces as a
/// validation problem naming the entry rather than a parse error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedDependency {
    pub group: String,
    pub artifact: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub scope: DependencyScope,
}

/// How a dependency is used by the module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyScope {
    /// Needed to compile against this module; part of its API.
    Compile,
    /// Needed at runtime only.
    Runtime,
    /// Used internally; consumers need it at runtime but not to compile.
    #[default]
    Implementation,
}

impl DependencyScope {
    /// The scope written to a published descriptor.
    ///
    /// Descriptor formats only know `compile` and `runtime`; an
    /// implementation dependency is still required on a consumer's runtime
    /// classpath, so it is published as `runtime`.
    pub fn published(self) -> Self {
        match self {
            Self::Compile => Self::Compile,
            Self::Runtime | Self::Implementation => Self::Runtime,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Compile => "compile",
            Self::Runtime => "runtime",
            Self::Implementation => "implementation",
        }
    }

    /// Parse a descriptor scope string; unknown scopes map to `None`.
    pub fn from_descriptor(scope: &str) -> Option<Self> {
        match scope {
            "compile" => Some(Self::Compile),
            "runtime" => Some(Self::Runtime),
            _ => None,
        }
    }
}

/// A validated dependency as it appears in a built descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    pub group: String,
    pub artifact: String,
    pub version: String,
    pub scope: DependencyScope,
}

impl DependencySpec {
    /// Validate this entry and convert it into a publishable [`Dependency`].
    ///
    /// `key` is the entry's name in the `[dependencies]` table and is used to
    /// label problems. All problems are returned, not just the first.
    pub fn resolve(&self, key: &str) -> Result<Dependency, Vec<String>> {
        let (group, artifact, version, scope) = match self {
            DependencySpec::Short(s) => {
                let parts: Vec<&str> = s.split(':').collect();
                match parts.as_slice() {
                    [g, a, v] => (g.to_string(), a.to_string(), Some(v.to_string()), DependencyScope::default()),
                    [g, a] => (g.to_string(), a.to_string(), None, DependencyScope::default()),
                    _ => {
                        return Err(vec![format!(
                            "dependencies.{key}: '{s}' is not of the form group:artifact:version"
                        )])
                    }
                }
            }
            DependencySpec::Detailed(d) => (
                d.group.clone(),
                d.artifact.clone(),
                d.version.clone(),
                d.scope,
            ),
        };

        let mut problems = Vec::new();
        for (name, value) in [("group", &group), ("artifact", &artifact)] {
            if let Err(reason) = check_coordinate_part(value) {
                problems.push(format!("dependencies.{key}.{name}: {reason}"));
            }
        }
        let version = version.unwrap_or_default();
        if let Err(reason) = version::check_concrete(&version) {
            problems.push(format!("dependencies.{key}.version: {reason}"));
        }

        if problems.is_empty() {
            Ok(Dependency {
                group: group.trim().to_string(),
                artifact: artifact.trim().to_string(),
                version: version.trim().to_string(),
                scope: scope.published(),
            })
        } else {
            Err(problems)
        }
    }
}
