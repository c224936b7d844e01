//! Outcome of one publish operation.

use serde::Serialize;

use hoist_core::identity::ModuleIdentity;

/// Report label of the descriptor upload.
pub const POM_LABEL: &str = "pom";

/// Report label of the `maven-metadata.xml` upload.
pub const METADATA_LABEL: &str = "maven-metadata";

/// Per-item results of publishing one module version to one repository.
///
/// Items appear in artifact-set order, followed by the POM and, when it was
/// attempted, the metadata update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishReport {
    pub identity: ModuleIdentity,
    pub repository: String,
    pub items: Vec<ItemReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemReport {
    /// Artifact classifier; empty for the primary artifact, [`POM_LABEL`]
    /// or [`METADATA_LABEL`] for the generated files.
    pub classifier: String,
    /// Repository-relative path of the uploaded file.
    pub path: String,
    pub outcome: ItemOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "kebab-case")]
pub enum ItemOutcome {
    Uploaded { status: u16 },
    Failed { detail: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PublishStatus {
    Completed,
    PartiallyFailed,
}

impl ItemReport {
    pub fn uploaded(classifier: &str, path: &str, status: u16) -> Self {
        Self {
            classifier: classifier.to_string(),
            path: path.to_string(),
            outcome: ItemOutcome::Uploaded { status },
        }
    }

    pub fn failed(classifier: &str, path: &str, detail: impl Into<String>) -> Self {
        Self {
            classifier: classifier.to_string(),
            path: path.to_string(),
            outcome: ItemOutcome::Failed {
                detail: detail.into(),
            },
        }
    }

    pub fn label(&self) -> &str {
        if self.classifier.is_empty() {
            "primary"
        } else {
            &self.classifier
        }
    }

    pub fn is_uploaded(&self) -> bool {
        matches!(self.outcome, ItemOutcome::Uploaded { .. })
    }
}

impl PublishReport {
    pub fn status(&self) -> PublishStatus {
        if self.items.iter().all(ItemReport::is_uploaded) {
            PublishStatus::Completed
        } else {
            PublishStatus::PartiallyFailed
        }
    }

    /// Items that did not upload; re-publishing these is safe.
    pub fn failed(&self) -> Vec<&ItemReport> {
        self.items.iter().filter(|i| !i.is_uploaded()).collect()
    }

    /// Whether the repository received anything at all.
    pub fn published_anything(&self) -> bool {
        self.items.iter().any(ItemReport::is_uploaded)
    }
}
