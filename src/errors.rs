//! Structured error types for the editor core and its storage client.
//!
//! Invalid catalog references and operations on absent ids are not errors
//! in this crate (they coerce to null or no-op); only endpoint validation
//! and storage transport produce typed failures.

use thiserror::Error;

/// Graph store errors
#[derive(Error, Debug)]
pub enum GraphError {
    /// A connection endpoint references a node that is not in the store
    #[error("invalid endpoint: node '{0}' not found in graph")]
    InvalidEndpoint(String),
}

/// Storage collaborator errors
#[derive(Error, Debug)]
pub enum StorageError {
    /// Project name rejected before any request was made
    #[error("invalid project name '{0}': use only letters, numbers, hyphens, underscores")]
    InvalidName(String),

    /// The underlying HTTP call failed
    #[error("{op} failed")]
    Transport {
        /// Name of the attempted operation
        op: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status
    #[error("{op} failed with status {status}")]
    Status {
        /// Name of the attempted operation
        op: &'static str,
        status: reqwest::StatusCode,
    },
}

impl StorageError {
    /// The operation that was being attempted, for callers that log or
    /// route on it
    pub fn operation(&self) -> &'static str {
        match self {
            StorageError::InvalidName(_) => "validate name",
            StorageError::Transport { op, .. } => op,
            StorageError::Status { op, .. } => op,
        }
    }
}

/// Result type alias for graph operations
pub type GraphResult<T> = Result<T, GraphError>;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
