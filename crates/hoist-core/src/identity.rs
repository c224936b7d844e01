use std::fmt;

use serde::{Deserialize, Serialize};

use crate::version;

/// Coordinates that uniquely identify one publishable unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleIdentity {
    pub group: String,
    pub artifact: String,
    pub version: String,
}

impl ModuleIdentity {
    pub fn new(
        group: impl Into<String>,
        artifact: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
            version: version.into(),
        }
    }

    /// Collect every problem with these coordinates, each prefixed by `field`
    /// (e.g. `module` or `parent`).
    pub fn problems(&self, field: &str) -> Vec<String> {
        let mut problems = Vec::new();
        for (name, value) in [("group", &self.group), ("artifact", &self.artifact)] {
            if let Err(reason) = check_coordinate_part(value) {
                problems.push(format!("{field}.{name}: {reason}"));
            }
        }
        if let Err(reason) = version::check_concrete(&self.version) {
            problems.push(format!("{field}.version: {reason}"));
        }
        problems
    }
}

impl fmt::Display for ModuleIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.artifact, self.version)
    }
}

/// Groups and artifact ids become path segments in the repository layout,
/// so separators and whitespace are rejected.
pub fn check_coordinate_part(value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err("is missing".to_string());
    }
    if value
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '/' | '\\' | ':'))
    {
        return Err(format!("'{value}' contains whitespace, ':' or a path separator"));
    }
    if value.starts_with('.') || value.ends_with('.') || value.contains("..") {
        return Err(format!("'{value}' has an empty segment"));
    }
    Ok(())
}
