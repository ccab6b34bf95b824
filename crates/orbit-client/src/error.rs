//! Error types for the API transport.

use thiserror::Error;

/// Error type for API operations.
///
/// Form-validation problems are not represented here: caller-supplied data
/// is validated before it reaches the transport.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The server responded with a non-success status.
    #[error("API error ({status}): {message}")]
    Http { status: u16, message: String },

    /// No usable response was received.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Local credential storage was unavailable.
    #[error("Storage error: {0}")]
    Storage(#[from] orbit_storage::StorageError),

    /// The response body did not match the expected shape.
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// HTTP status of the failure, when the server responded at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;
