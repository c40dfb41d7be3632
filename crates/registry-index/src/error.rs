//! Error types for registry-index.

use thiserror::Error;

/// Errors that can occur while looking up a crate in a registry index.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The HTTP request to a sparse index failed
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The sparse index answered with a non-success status
    #[error("statusCode={0}")]
    Status(u16),

    #[error("invalid index url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Spawning `git` failed
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// `git show` exited with an error
    #[error("git: {0}")]
    Git(String),

    /// An index line was not valid JSON
    #[error("invalid index entry: {0}")]
    Deserialize(#[from] serde_json::Error),

    /// The dependency names a registry that is not configured
    #[error("unknown registry `{0}`")]
    UnknownRegistry(String),

    /// The index has no usable versions
    #[error("no versions found")]
    NoVersions,
}
