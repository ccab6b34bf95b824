//! Durable credential storage for the Orbit account SDK.
//!
//! This crate provides:
//! - A [`SecureStorage`] trait for key-value persistence backends
//! - [`FileStorage`], a JSON file-backed store under `~/.orbit`
//! - [`MemoryStorage`], an in-memory store for tests and ephemeral sessions
//! - [`TokenVault`], the high-level async API the rest of the SDK uses

mod file;
mod keys;
mod memory;
mod traits;
mod vault;

pub use file::FileStorage;
pub use keys::StorageKeys;
pub use memory::MemoryStorage;
pub use traits::SecureStorage;
pub use vault::{StoredSession, TokenVault};

use thiserror::Error;

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Backend-specific storage error
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
