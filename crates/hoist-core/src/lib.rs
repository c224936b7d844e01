//! Core data types for the Hoist publish tool.
//!
//! This crate defines the values that flow through a publish: the parsed
//! `Hoist.toml` project file, module identity, dependency declarations,
//! Maven version ordering, the artifact set, and the immutable package
//! descriptor assembled from configuration.
//!
//! This crate is intentionally free of async code and network I/O.

/// Name of the project file Hoist looks for.
pub const PROJECT_FILE: &str = "Hoist.toml";

/// Name of the secrets file loaded alongside the project file.
pub const ENV_FILE: &str = ".hoist.env";

pub mod artifact;
pub mod config;
pub mod dependency;
pub mod descriptor;
pub mod identity;
pub mod properties;
pub mod version;
