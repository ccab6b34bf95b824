//! Error types for the session lifecycle.

use thiserror::Error;

/// Error type for session operations.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The API call behind the operation failed.
    #[error("{0}")]
    Api(#[from] orbit_client::ApiError),

    /// Local credential storage was unavailable.
    #[error("Storage error: {0}")]
    Storage(#[from] orbit_storage::StorageError),

    /// SDK setup problem (paths, configuration).
    #[error("Setup error: {0}")]
    Setup(#[from] orbit_core::CoreError),

    /// The operation is not valid in the current session state.
    #[error("Invalid session transition: {0}")]
    Transition(String),
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;
