//! HTTP transport for the Orbit account API.
//!
//! [`ApiClient`] attaches the stored bearer token to outgoing requests and,
//! on a 401, performs exactly one refresh-and-retry cycle before handing
//! the original response back to the caller. All payloads are validated
//! into typed models at this boundary.

mod error;
mod http;
mod models;
pub mod testing;

#[cfg(test)]
mod tests;

pub use error::{ApiError, ApiResult};
pub use http::ApiClient;
pub use models::{
    ApiEnvelope, AuthPayload, PicturePayload, ProfilePayload, RefreshPayload, RegisterRequest,
};
