use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all Hoist operations.
#[derive(Debug, Error, Diagnostic)]
pub enum HoistError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or malformed project file (e.g. Hoist.toml).
    #[error("Config error: {message}")]
    #[diagnostic(help("Check your Hoist.toml for syntax errors"))]
    Config { message: String },

    /// A descriptor, artifact set, or identity failed validation.
    /// Nothing has been sent to the repository.
    #[error("Validation failed: {message}")]
    #[diagnostic(help("Nothing was published; fix the reported fields and retry"))]
    Validation { message: String },

    /// Credentials for a repository could not be resolved.
    /// Nothing has been sent to the repository.
    #[error("Authentication failed for repository '{repository}': {message}")]
    #[diagnostic(help(
        "Nothing was published; set HOIST_<REPO>_USERNAME / HOIST_<REPO>_PASSWORD \
         (or HOIST_<REPO>_TOKEN) in the environment or .hoist.env"
    ))]
    Authentication { repository: String, message: String },

    /// A single upload was rejected or could not be delivered.
    #[error("Upload of {path} failed: {message}")]
    Upload { path: String, message: String },

    /// Network request failed outside of an individual upload.
    #[error("Network error: {message}")]
    Network { message: String },

    /// The operation was cancelled before this step ran.
    #[error("Cancelled: {message}")]
    Cancelled { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}
