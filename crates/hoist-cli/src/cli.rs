//! CLI argument definitions for Hoist.
//!
//! Each command corresponds to a handler in the [`super::commands`] module.

use std::path::PathBuf;

use clap::builder::RangedU64ValueParser;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "hoist",
    version,
    about = "Build Maven descriptors and publish artifacts to Maven repositories",
    long_about = "Hoist reads Hoist.toml, synthesizes a Maven POM for the module, and \
                  uploads the already-built artifacts, checksums and POM to a Maven \
                  repository over HTTP(S) or to a file:// directory."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check Hoist.toml, the descriptor and the artifact files
    Validate,

    /// Write the generated POM to disk
    Pom {
        /// Output file (default: build/publications/<artifact>/pom-default.xml)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Upload artifacts, checksums and the POM to a repository
    Publish {
        /// Repository name from [repositories]
        #[arg(short, long, env = "HOIST_REPOSITORY")]
        repository: Option<String>,
        /// Maximum concurrent uploads
        #[arg(short, long, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
        jobs: Option<usize>,
        /// Show what would be uploaded without contacting the repository
        #[arg(long)]
        dry_run: bool,
        /// Do not update maven-metadata.xml
        #[arg(long)]
        no_metadata: bool,
        /// Print the publish report as JSON on stdout
        #[arg(long)]
        json: bool,
    },
}

pub fn parse() -> Cli {
    Cli::parse()
}
