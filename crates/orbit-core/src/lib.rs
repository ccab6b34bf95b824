//! Core types, configuration, and utilities for the Orbit account SDK.

mod config;
mod error;
mod logging;
mod paths;
mod types;

pub use config::{
    Config, DEFAULT_API_BASE_URL, DEFAULT_LOG_LEVEL, DEFAULT_REQUEST_TIMEOUT_SECS,
};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, parse_level};
pub use paths::Paths;
pub use types::{Address, CredentialPair, UserRecord};
