use hibernate_remote::display::spawn_status_display;
use hibernate_remote::error::AppError;
use hibernate_remote::logger::initialize as LoggerInitialize;
use hibernate_remote::paths::AppPaths;
use hibernate_remote::settings::apply_from_disk;

use control_core::coordinator::LifecycleCoordinator;
use control_core::reclaim::SystemPortReclaimer;
use control_core::server::ControlServer;
use control_core::trigger::TriggerScheduler;

use common::ErrorLocation;

use std::panic::Location;
use std::sync::Arc;

use log::{error, info};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Missing .env is fine
    let _ = dotenvy::dotenv();

    let paths = AppPaths::resolve()?;
    paths.ensure_exists()?;

    // Initialize logger FIRST
    LoggerInitialize(paths.log_dir())?;

    info!("Hibernate remote starting");
    info!("Config directory: {}", paths.config_dir().display());
    info!("Log directory: {}", paths.log_dir().display());

    let coordinator = LifecycleCoordinator::new(ControlServer::new(
        Arc::new(SystemPortReclaimer),
        TriggerScheduler::default(),
    ));
    let display = spawn_status_display(coordinator.subscribe_status());

    // A bad config keeps the app up so a reload can fix it.
    if let Err(e) = apply_from_disk(&coordinator, &paths).await {
        error!("Startup config not applied: {e}");
    }

    wait_for_quit(&coordinator, &paths).await?;

    info!("Shutting down");
    coordinator
        .shutdown()
        .await
        .map_err(|e| AppError::core(e, ErrorLocation::from(Location::caller())))?;

    display.abort();
    info!("Hibernate remote stopped");
    Ok(())
}

/// Serve until Ctrl-C or SIGTERM; SIGHUP re-applies `config.json`.
#[cfg(unix)]
async fn wait_for_quit(
    coordinator: &LifecycleCoordinator,
    paths: &AppPaths,
) -> Result<(), AppError> {
    use tokio::signal::unix::{SignalKind, signal};

    let location = ErrorLocation::from(Location::caller());
    let install = |kind: SignalKind, name: &str| {
        signal(kind).map_err(|e| AppError::App {
            message: format!("Failed to install {name} handler: {e}"),
            location,
        })
    };

    let mut hangup = install(SignalKind::hangup(), "SIGHUP")?;
    let mut terminate = install(SignalKind::terminate(), "SIGTERM")?;

    info!("Send SIGHUP to reload the config, Ctrl-C to quit");

    loop {
        tokio::select! {
            _ = hangup.recv() => {
                info!("SIGHUP received, reloading config");
                if let Err(e) = apply_from_disk(coordinator, paths).await {
                    error!("Reload failed: {e}");
                }
            }
            _ = terminate.recv() => {
                info!("SIGTERM received");
                return Ok(());
            }
            result = tokio::signal::ctrl_c() => {
                return result.map_err(|e| AppError::App {
                    message: format!("Failed to listen for Ctrl-C: {e}"),
                    location,
                });
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_quit(
    _coordinator: &LifecycleCoordinator,
    _paths: &AppPaths,
) -> Result<(), AppError> {
    info!("Press Ctrl-C to quit; restart to apply config changes");

    tokio::signal::ctrl_c().await.map_err(|e| AppError::App {
        message: format!("Failed to listen for Ctrl-C: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })
}
