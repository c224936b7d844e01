//! Repository targets and the Maven directory layout.
//!
//! Every path here is a pure function of the module identity: publishing
//! the same coordinates twice addresses the same files.

use hoist_core::config::{AuthMode, RepositoryEntry};
use hoist_core::identity::ModuleIdentity;

/// File name of the artifact-level version listing.
pub const METADATA_FILE: &str = "maven-metadata.xml";

/// A configured upload destination.
///
/// Holds no credential material; see [`crate::auth`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryTarget {
    pub name: String,
    pub url: String,
    pub auth: AuthMode,
}

impl RepositoryTarget {
    pub fn new(name: impl Into<String>, url: &str, auth: AuthMode) -> Self {
        Self {
            name: name.into(),
            url: url.trim_end_matches('/').to_string(),
            auth,
        }
    }

    /// Build a `RepositoryTarget` from a name and a project file `RepositoryEntry`.
    pub fn from_entry(name: &str, entry: &RepositoryEntry) -> Self {
        match entry {
            RepositoryEntry::Url(url) => Self::new(name, url, AuthMode::Auto),
            RepositoryEntry::Detailed { url, auth, .. } => Self::new(name, url, *auth),
        }
    }

    /// Full URL of a repository-relative path.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.url, path)
    }
}

/// Standard Maven layout directory for a given coordinate.
///
/// `org.ow2.asm:asm-deprecated:9.9` becomes `org/ow2/asm/asm-deprecated/9.9`
pub fn coordinate_path(identity: &ModuleIdentity) -> String {
    format!("{}/{}", artifact_dir(identity), identity.version)
}

/// `<artifactId>-<version>[-<classifier>].<extension>`
pub fn artifact_file_name(identity: &ModuleIdentity, classifier: &str, extension: &str) -> String {
    if classifier.is_empty() {
        format!("{}-{}.{extension}", identity.artifact, identity.version)
    } else {
        format!(
            "{}-{}-{classifier}.{extension}",
            identity.artifact, identity.version
        )
    }
}

/// Repository-relative path of one artifact file.
pub fn artifact_path(identity: &ModuleIdentity, classifier: &str, extension: &str) -> String {
    format!(
        "{}/{}",
        coordinate_path(identity),
        artifact_file_name(identity, classifier, extension)
    )
}

/// Repository-relative path of the descriptor.
pub fn pom_path(identity: &ModuleIdentity) -> String {
    artifact_path(identity, "", "pom")
}

/// Repository-relative path of the artifact-level `maven-metadata.xml`.
pub fn metadata_path(identity: &ModuleIdentity) -> String {
    format!("{}/{METADATA_FILE}", artifact_dir(identity))
}

fn artifact_dir(identity: &ModuleIdentity) -> String {
    format!("{}/{}", identity.group.replace('.', "/"), identity.artifact)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asm() -> ModuleIdentity {
        ModuleIdentity::new("org.ow2.asm", "asm-deprecated", "9.9")
    }

    #[test]
    fn coordinate_path_replaces_dots() {
        assert_eq!(coordinate_path(&asm()), "org/ow2/asm/asm-deprecated/9.9");
    }

    #[test]
    fn coordinate_path_is_stable() {
        let a = coordinate_path(&asm());
        let b = coordinate_path(&asm().clone());
        assert_eq!(a, b);
    }

    #[test]
    fn artifact_path_with_classifier() {
        assert_eq!(
            artifact_path(&asm(), "sources", "jar"),
            "org/ow2/asm/asm-deprecated/9.9/asm-deprecated-9.9-sources.jar"
        );
    }

    #[test]
    fn artifact_path_without_classifier() {
        assert!(artifact_path(&asm(), "", "jar").ends_with("/asm-deprecated-9.9.jar"));
    }

    #[test]
    fn pom_and_metadata_paths() {
        assert_eq!(
            pom_path(&asm()),
            "org/ow2/asm/asm-deprecated/9.9/asm-deprecated-9.9.pom"
        );
        assert_eq!(
            metadata_path(&asm()),
            "org/ow2/asm/asm-deprecated/maven-metadata.xml"
        );
    }

    #[test]
    fn from_entry_url_trims_slash() {
        let entry = RepositoryEntry::Url("https://repo.example.com/maven/".to_string());
        let target = RepositoryTarget::from_entry("test", &entry);
        assert_eq!(target.url, "https://repo.example.com/maven");
        assert_eq!(target.auth, AuthMode::Auto);
        assert_eq!(
            target.url_for("a/b.jar"),
            "https://repo.example.com/maven/a/b.jar"
        );
    }

    #[test]
    fn from_entry_detailed_keeps_auth_mode() {
        let entry = RepositoryEntry::Detailed {
            url: "https://repo.rafi67000.xyz/vintageforge".to_string(),
            auth: AuthMode::Basic,
            username: Some("user".to_string()),
            password: Some("pass".to_string()),
            token: None,
        };
        let target = RepositoryTarget::from_entry("vintageforge", &entry);
        assert_eq!(target.auth, AuthMode::Basic);
    }
}
