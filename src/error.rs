//! Error types for stevedore builds and reconciliation runs

use thiserror::Error;

/// Main error type for build and reconciliation operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Workspace root path is unset or empty
    #[error("invalid workspace root: {0}")]
    InvalidWorkspaceRoot(String),

    /// A builder was handed a build context for a different backend
    #[error("invalid build context: {0}")]
    InvalidBuildContext(String),

    /// A host-path volume was declared without a host path
    #[error("missing host path: {0}")]
    MissingHostPath(String),

    /// An EBS volume was declared without a resolvable volume id
    #[error("missing volume id: {0}")]
    MissingVolumeId(String),

    /// Git-sync was requested for the workspace volume without a repository
    #[error("missing git-sync repository: {0}")]
    MissingGitSyncRepo(String),

    /// A volume source the target backend cannot express
    #[error("unsupported volume type: {0}")]
    UnsupportedVolumeType(String),

    /// A persistent-volume reclaim policy outside Retain/Delete/Recycle
    #[error("invalid reclaim policy: {0}")]
    InvalidReclaimPolicy(String),

    /// General configuration validation error
    #[error("validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization error (env files, manifest emission)
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Transport error raised by the backend API client
    #[error("api error: {0}")]
    Api(String),
}

impl Error {
    /// Create a validation error with the given message
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a serialization error with the given message
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Create an API transport error with the given message
    pub fn api(msg: impl Into<String>) -> Self {
        Self::Api(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Configuration errors carry enough context to name the failing app.
    #[test]
    fn configuration_errors_render_with_context() {
        let err = Error::InvalidWorkspaceRoot("app 'airflow' has an empty workspace root".into());
        assert!(err.to_string().contains("invalid workspace root"));
        assert!(err.to_string().contains("airflow"));

        let err = Error::MissingVolumeId("volume 'data' on app 'postgres'".into());
        assert!(err.to_string().contains("missing volume id"));
        assert!(err.to_string().contains("postgres"));
    }

    #[test]
    fn helper_constructors_categorize() {
        match Error::validation("bad port") {
            Error::Validation(msg) => assert_eq!(msg, "bad port"),
            _ => panic!("expected Validation variant"),
        }
        match Error::api("connection refused") {
            Error::Api(msg) => assert_eq!(msg, "connection refused"),
            _ => panic!("expected Api variant"),
        }
    }
}
