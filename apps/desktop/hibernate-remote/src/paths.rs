//! Where the app keeps its config file and logs.

use crate::error::AppError;

use common::ErrorLocation;

use std::env;
use std::fs::create_dir_all;
use std::panic::Location;
use std::path::{Path, PathBuf};

use log::debug;

/// Overrides the config directory when set and non-empty.
pub const CONFIG_DIR_ENV: &str = "HIBERNATE_REMOTE_CONFIG_DIR";

const APP_DIR_NAME: &str = "hibernate-remote";
const LOG_DIR_NAME: &str = "logs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    config_dir: PathBuf,
    log_dir: PathBuf,
}

impl AppPaths {
    /// Resolve from [`CONFIG_DIR_ENV`], else `<platform config dir>/hibernate-remote`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::App`] if neither is available.
    #[track_caller]
    pub fn resolve() -> Result<Self, AppError> {
        if let Ok(dir) = env::var(CONFIG_DIR_ENV)
            && !dir.trim().is_empty()
        {
            debug!("Config directory from {CONFIG_DIR_ENV}: {dir}");
            return Ok(Self::from_config_dir(dir));
        }

        let base = dirs::config_dir().ok_or_else(|| AppError::App {
            message: format!(
                "No platform config directory found; set {CONFIG_DIR_ENV} instead"
            ),
            location: ErrorLocation::from(Location::caller()),
        })?;

        Ok(Self::from_config_dir(base.join(APP_DIR_NAME)))
    }

    pub fn from_config_dir(config_dir: impl Into<PathBuf>) -> Self {
        let config_dir = config_dir.into();
        let log_dir = config_dir.join(LOG_DIR_NAME);
        Self {
            config_dir,
            log_dir,
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Create the config and log directories if missing.
    #[track_caller]
    pub fn ensure_exists(&self) -> Result<(), AppError> {
        let location = ErrorLocation::from(Location::caller());

        for dir in [&self.config_dir, &self.log_dir] {
            create_dir_all(dir).map_err(|e| AppError::App {
                message: format!("Failed to create {}: {e}", dir.display()),
                location,
            })?;
        }

        Ok(())
    }
}
