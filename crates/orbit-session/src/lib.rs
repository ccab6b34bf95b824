//! Session lifecycle for the Orbit account SDK.
//!
//! [`SessionManager`] drives a four-state machine (unauthenticated,
//! authenticating, authenticated, failed) over the credential vault and the
//! API client: login, registration, logout, startup restoration, and
//! profile maintenance. Mutating operations are serialized, and every
//! state change is published as a [`Session`] snapshot over a watch
//! channel.

mod bootstrap;
mod error;
mod machine;
mod manager;

#[cfg(test)]
mod tests;

pub use bootstrap::{bootstrap, bootstrap_with_paths};
pub use error::{SessionError, SessionResult};
pub use machine::session_machine;
pub use manager::{Session, SessionManager, SessionStatus};
