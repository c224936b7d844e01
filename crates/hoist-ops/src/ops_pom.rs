//! Operation: write the generated POM to disk.

use std::path::{Path, PathBuf};

use hoist_core::config::ProjectConfig;
use hoist_core::descriptor;
use hoist_maven::pom::render_pom;
use hoist_util::errors::HoistError;

/// Default output location, relative to the project root.
pub fn default_output(artifact: &str) -> PathBuf {
    Path::new("build")
        .join("publications")
        .join(artifact)
        .join("pom-default.xml")
}

/// Build the descriptor from `Hoist.toml` and write it as a POM.
///
/// Artifacts are not read. Returns the path written.
pub fn generate_pom(project_root: &Path, output: Option<&Path>) -> miette::Result<PathBuf> {
    let config = ProjectConfig::from_path(&project_root.join(hoist_core::PROJECT_FILE))?;
    let descriptor = descriptor::build(&config.descriptor)?;
    let xml = render_pom(&descriptor)?;

    let dest = match output {
        Some(path) if path.is_absolute() => path.to_path_buf(),
        Some(path) => project_root.join(path),
        None => project_root.join(default_output(&descriptor.identity.artifact)),
    };
    hoist_util::fs::write_atomic(&dest, xml.as_bytes()).map_err(|e| HoistError::Generic {
        message: format!("Failed to write {}: {e}", dest.display()),
    })?;

    tracing::info!("Wrote POM for {} to {}", descriptor.identity, dest.display());
    hoist_util::progress::status("Generated", &dest.display().to_string());
    Ok(dest)
}
