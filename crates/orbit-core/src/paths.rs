//! File system paths for the SDK.

use crate::{CoreError, CoreResult};
use std::path::PathBuf;

/// Directory name under the user's home for Orbit runtime files.
const BASE_DIR_NAME: &str = ".orbit";

/// Manages file system paths for the SDK.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Base directory for runtime files (~/.orbit)
    base_dir: PathBuf,
}

impl Paths {
    /// Create a new Paths instance rooted at `~/.orbit`.
    pub fn new() -> CoreResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| CoreError::Path("Could not determine home directory".to_string()))?;
        Ok(Self {
            base_dir: home.join(BASE_DIR_NAME),
        })
    }

    /// Create a new Paths instance with a custom base directory.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory (~/.orbit).
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the config file path (~/.orbit/config.json).
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the credential store path (~/.orbit/credentials.json).
    pub fn credentials_file(&self) -> PathBuf {
        self.base_dir.join("credentials.json")
    }

    /// Ensure the base directory exists.
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        Ok(())
    }
}
