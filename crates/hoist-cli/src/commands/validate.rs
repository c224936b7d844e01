//! Handler for `hoist validate`.

use miette::Result;

pub fn exec() -> Result<()> {
    let project_root = super::project_root()?;
    hoist_ops::ops_validate::validate(&project_root)?;
    Ok(())
}
