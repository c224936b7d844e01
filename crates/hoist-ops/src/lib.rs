//! High-level operations behind the `hoist` commands.

pub mod cancel;
pub mod ops_pom;
pub mod ops_publish;
pub mod ops_validate;
pub mod report;
