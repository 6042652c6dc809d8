//! Reading `config.json` and handing it to the coordinator.

use crate::error::AppError;
use crate::paths::AppPaths;

use control_core::config::ServerConfig;
use control_core::coordinator::LifecycleCoordinator;
use control_core::server::ServerStatus;

use common::ErrorLocation;

use std::panic::Location;

use log::{error, info};

/// Load the config, writing the defaults back on first run.
///
/// # Errors
///
/// Returns [`AppError::Core`] if the file exists but cannot be read or
/// parsed, or if the defaults cannot be written.
#[track_caller]
pub fn load_or_create(paths: &AppPaths) -> Result<ServerConfig, AppError> {
    let location = ErrorLocation::from(Location::caller());
    let dir = paths.config_dir();
    let file = ServerConfig::file_path(dir);
    let first_run = !file.exists();

    let config = ServerConfig::load(dir).map_err(|e| AppError::core(e, location))?;

    if first_run {
        config.save(dir).map_err(|e| AppError::core(e, location))?;
        info!("Wrote default config to {}", file.display());
    }

    Ok(config)
}

/// Re-read the config from disk and restart the listener with it.
///
/// A config that cannot be loaded still replaces the running one: the old
/// listener is stopped and the status reports the failure.
///
/// # Returns
///
/// The port now bound.
///
/// # Errors
///
/// Returns [`AppError::Core`] if the config cannot be loaded or the listener
/// cannot start. Nothing is bound afterwards in either case.
pub async fn apply_from_disk(
    coordinator: &LifecycleCoordinator,
    paths: &AppPaths,
) -> Result<u16, AppError> {
    let location = ErrorLocation::from(Location::caller());

    let config = match load_or_create(paths) {
        Ok(config) => config,
        Err(e) => {
            error!("Config not loaded, stopping listener: {e}");
            coordinator
                .shutdown()
                .await
                .map_err(|e| AppError::core(e, location))?;
            coordinator.status().publish(ServerStatus::Failed {
                reason: format!(
                    "cannot load {}",
                    ServerConfig::file_path(paths.config_dir()).display()
                ),
            });
            return Err(e);
        }
    };

    info!(
        "Applying config: port {}, script {}",
        config.port, config.script_path
    );

    coordinator
        .apply_config(config)
        .await
        .map_err(|e| AppError::core(e, location))
}
