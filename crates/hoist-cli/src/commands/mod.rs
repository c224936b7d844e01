//! Command dispatch and handler modules.

mod pom;
mod publish;
mod validate;

use std::path::PathBuf;

use miette::Result;

use hoist_util::errors::HoistError;
use hoist_util::fs::find_ancestor_with;

use crate::cli::{Cli, Command};

/// Route a parsed CLI invocation to the appropriate command handler.
pub async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Validate => validate::exec(),
        Command::Pom { output } => pom::exec(output.as_deref()),
        Command::Publish {
            repository,
            jobs,
            dry_run,
            no_metadata,
            json,
        } => {
            publish::exec(publish::Args {
                repository,
                jobs,
                dry_run,
                no_metadata,
                json,
            })
            .await
        }
    }
}

/// Directory holding `Hoist.toml`, searching upward from the working directory.
fn project_root() -> Result<PathBuf> {
    let cwd = std::env::current_dir().map_err(HoistError::Io)?;
    find_ancestor_with(&cwd, hoist_core::PROJECT_FILE).ok_or_else(|| {
        HoistError::Config {
            message: format!(
                "Could not find {} in current or parent directories",
                hoist_core::PROJECT_FILE
            ),
        }
        .into()
    })
}
