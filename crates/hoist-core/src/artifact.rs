//! The set of built files published together for one module version.

use hoist_util::errors::HoistError;

/// One built file: the primary binary or a classified companion.
#[derive(Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Empty for the primary artifact; e.g. `sources` or `javadoc` otherwise.
    pub classifier: String,
    /// File extension without the leading dot, e.g. `jar`.
    pub extension: String,
    pub data: Vec<u8>,
}

impl Artifact {
    pub fn primary(extension: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            classifier: String::new(),
            extension: extension.into(),
            data,
        }
    }

    pub fn classified(
        classifier: impl Into<String>,
        extension: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            classifier: classifier.into(),
            extension: extension.into(),
            data,
        }
    }

    pub fn is_primary(&self) -> bool {
        self.classifier.is_empty()
    }

    /// Label used in logs and reports; the primary artifact has none of its own.
    pub fn label(&self) -> &str {
        if self.is_primary() {
            "primary"
        } else {
            &self.classifier
        }
    }
}

impl std::fmt::Debug for Artifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Artifact")
            .field("classifier", &self.classifier)
            .field("extension", &self.extension)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Ordered set of artifacts keyed by classifier.
///
/// Classifiers are unique. Iteration yields the primary artifact first,
/// then classified artifacts in insertion order.
#[derive(Debug, Clone, Default)]
pub struct ArtifactSet {
    artifacts: Vec<Artifact>,
}

impl ArtifactSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an artifact, rejecting a classifier that is already present.
    pub fn insert(&mut self, artifact: Artifact) -> miette::Result<()> {
        if let Err(reason) = check_classifier(&artifact.classifier) {
            return Err(HoistError::Validation {
                message: format!("artifact classifier {reason}"),
            }
            .into());
        }
        let ext = &artifact.extension;
        if ext.trim().is_empty() || ext.starts_with('.') || ext.contains(['/', '\\']) {
            return Err(HoistError::Validation {
                message: format!(
                    "artifact '{}' has an invalid extension '{}'",
                    artifact.label(),
                    artifact.extension
                ),
            }
            .into());
        }
        if self.get(&artifact.classifier).is_some() {
            return Err(HoistError::Validation {
                message: format!("duplicate artifact classifier '{}'", artifact.label()),
            }
            .into());
        }
        if artifact.is_primary() {
            self.artifacts.insert(0, artifact);
        } else {
            self.artifacts.push(artifact);
        }
        Ok(())
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, artifact: Artifact) -> miette::Result<Self> {
        self.insert(artifact)?;
        Ok(self)
    }

    pub fn get(&self, classifier: &str) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.classifier == classifier)
    }

    pub fn primary(&self) -> Option<&Artifact> {
        self.get("")
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Artifact> {
        self.artifacts.iter()
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Check the set is publishable: non-empty with a primary artifact.
    pub fn validate(&self) -> miette::Result<()> {
        if self.is_empty() {
            return Err(HoistError::Validation {
                message: "artifact set is empty; nothing to publish".to_string(),
            }
            .into());
        }
        if self.primary().is_none() {
            return Err(HoistError::Validation {
                message: "artifact set has no primary artifact".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ArtifactSet {
    type Item = &'a Artifact;
    type IntoIter = std::slice::Iter<'a, Artifact>;

    fn into_iter(self) -> Self::IntoIter {
        self.artifacts.iter()
    }
}

fn check_classifier(classifier: &str) -> Result<(), String> {
    if classifier
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '/' | '\\' | ':'))
    {
        return Err(format!("'{classifier}' contains whitespace, ':' or a path separator"));
    }
    if classifier.eq_ignore_ascii_case("pom") {
        return Err("'pom' is reserved for the descriptor".to_string());
    }
    Ok(())
}
