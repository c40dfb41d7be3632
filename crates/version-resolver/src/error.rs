//! Error types for version-resolver.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("invalid version `{0}`")]
    InvalidVersion(String),

    #[error("invalid version requirement `{requirement}`: {reason}")]
    InvalidConstraint { requirement: String, reason: String },
}

impl VersionError {
    pub(crate) fn constraint(requirement: &str, reason: impl Into<String>) -> Self {
        Self::InvalidConstraint {
            requirement: requirement.to_string(),
            reason: reason.into(),
        }
    }
}
