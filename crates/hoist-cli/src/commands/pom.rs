//! Handler for `hoist pom`.

use std::path::Path;

use miette::Result;

pub fn exec(output: Option<&Path>) -> Result<()> {
    let project_root = super::project_root()?;
    hoist_ops::ops_pom::generate_pom(&project_root, output)?;
    Ok(())
}
