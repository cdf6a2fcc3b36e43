//! Error types
//!
//! `StoreError` covers a single call against the backing object store.
//! `ApiError` is what the filesystem layer and the CLI surface to callers.

use thiserror::Error;

/// Failure of one BlobStore primitive call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Object already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid object key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("Listing failed for prefix '{prefix}': {reason}")]
    ListFailure { prefix: String, reason: String },

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Errors surfaced by filesystem operations
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    /// Raised before any destructive step; callers confirm and retry with
    /// `OverwritePolicy::Replace`.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Cannot place '{from}' inside its own subtree at '{to}'")]
    CycleRejected { from: String, to: String },

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("{} key(s) failed: {}", failed.len(), failed.join(", "))]
    PartialBatchFailure { failed: Vec<String> },

    #[error("Storage error: {0}")]
    StorageError(#[from] StoreError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Preference error: {0}")]
    PreferenceError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

impl ApiError {
    /// True when the error is a confirmation decision point rather than a failure
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            ApiError::AlreadyExists(_) | ApiError::StorageError(StoreError::AlreadyExists(_))
        )
    }
}
