//! Shared utilities for the Hoist publish tool.
//!
//! This crate provides cross-cutting concerns used by all other Hoist crates:
//! error types, filesystem helpers, checksum hashing, and terminal status
//! and progress indicators.

pub mod errors;
pub mod fs;
pub mod hash;
pub mod progress;
