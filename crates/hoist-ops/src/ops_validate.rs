//! Operation: load the project and check that it is publishable.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use hoist_core::artifact::ArtifactSet;
use hoist_core::config::ProjectConfig;
use hoist_core::descriptor::{self, PackageDescriptor};
use hoist_core::properties;

/// Everything a publish needs, loaded from one project directory.
#[derive(Debug)]
pub struct Project {
    pub root: PathBuf,
    pub config: ProjectConfig,
    pub descriptor: PackageDescriptor,
    pub artifacts: ArtifactSet,
    /// Contents of `.hoist.env`.
    pub env: BTreeMap<String, String>,
}

/// Parse `Hoist.toml`, build the descriptor and read every artifact.
///
/// Fails on the first stage that has problems; descriptor problems are
/// reported together.
pub fn load_project(project_root: &Path) -> miette::Result<Project> {
    let config = ProjectConfig::from_path(&project_root.join(hoist_core::PROJECT_FILE))?;
    let env = properties::load_env_file(&project_root.join(hoist_core::ENV_FILE))?;
    let descriptor = descriptor::build(&config.descriptor)?;
    let artifacts = config.load_artifacts(project_root)?;
    artifacts.validate()?;

    Ok(Project {
        root: project_root.to_path_buf(),
        config,
        descriptor,
        artifacts,
        env,
    })
}

/// Validate the project and print a summary.
pub fn validate(project_root: &Path) -> miette::Result<Project> {
    use hoist_util::progress::{status, status_info};

    let project = load_project(project_root)?;

    status_info(
        "Descriptor",
        &format!(
            "{} ({} dependencies, {} license(s))",
            project.descriptor.identity,
            project.descriptor.dependencies.len(),
            project.descriptor.licenses.len()
        ),
    );
    for artifact in &project.artifacts {
        status_info(
            "Artifact",
            &format!(
                "{} .{} ({} bytes)",
                artifact.label(),
                artifact.extension,
                artifact.data.len()
            ),
        );
    }
    status("Valid", &project.descriptor.identity.to_string());
    Ok(project)
}
