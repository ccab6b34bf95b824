//! Wiring helpers that assemble the SDK from configuration.

use crate::{SessionManager, SessionResult};
use orbit_client::ApiClient;
use orbit_core::{Config, Paths};
use orbit_storage::{FileStorage, TokenVault};
use std::sync::Arc;

/// Build a [`SessionManager`] backed by the on-disk credential store under
/// `~/.orbit`.
///
/// Does not restore the stored session; callers drive
/// [`SessionManager::restore`] at startup.
pub fn bootstrap(config: &Config) -> SessionResult<SessionManager> {
    let paths = Paths::new()?;
    bootstrap_with_paths(config, &paths)
}

/// Same as [`bootstrap`] with an explicit base directory, for tests and
/// embedders.
pub fn bootstrap_with_paths(config: &Config, paths: &Paths) -> SessionResult<SessionManager> {
    paths.ensure_dirs()?;
    // Reject a malformed base URL here rather than on the first request.
    config.api_base_url()?;

    let storage = FileStorage::open(paths.credentials_file())?;
    let vault = TokenVault::new(Arc::new(storage));
    let api = ApiClient::from_config(config, vault.clone())?;
    Ok(SessionManager::new(api, vault))
}
