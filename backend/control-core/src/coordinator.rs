//! Serialized start/restart of the control listener.
//!
//! # Architecture
//!
//! Uses an actor, the same way the rest of the app manages shared state:
//! - Commands are sent via an mpsc channel
//! - A dedicated task owns the active [`ServerHandle`] and processes commands
//!   one at a time, so stop-then-start of two overlapping `apply_config`
//!   calls can never interleave
//! - Reads of the active listener go through an `Arc<RwLock<_>>`
//!
//! The actor is spawned lazily on first use, so a coordinator can be built
//! before the tokio runtime is running.

use crate::config::ServerConfig;
use crate::error::server::ServerError;
use crate::server::{ControlServer, ServerHandle, ServerStatus, StatusSink};

use common::ErrorLocation;

use std::panic::Location;
use std::sync::Arc;

use log::{error, info, warn};
use tokio::sync::{Mutex, RwLock, mpsc, oneshot, watch};

const COMMAND_CHANNEL_CAPACITY: usize = 16;

/// Commands processed by the coordinator actor.
#[derive(Debug)]
pub enum CoordinatorCommand {
    /// Stop the current listener (if any) and start one for the new config.
    ApplyConfig {
        config: ServerConfig,
        reply: oneshot::Sender<Result<u16, ServerError>>,
    },

    /// Stop the current listener (if any) and stay unbound.
    Shutdown { reply: oneshot::Sender<()> },
}

/// The listener currently bound, as seen by readers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveListener {
    pub config: ServerConfig,
    pub port: u16,
}

/// Single owner of the control listener.
///
/// This type is `Clone`; all clones drive the same actor and therefore the
/// same listener.
#[derive(Clone)]
pub struct LifecycleCoordinator {
    server: Arc<ControlServer>,

    /// Channel to send commands to the actor
    command_tx: Arc<Mutex<Option<mpsc::Sender<CoordinatorCommand>>>>,

    /// Shared read-only view of the bound listener
    active: Arc<RwLock<Option<ActiveListener>>>,

    /// Track if actor has been initialized
    actor_init: Arc<Mutex<bool>>,
}

impl LifecycleCoordinator {
    pub fn new(server: ControlServer) -> Self {
        Self {
            server: Arc::new(server),
            command_tx: Arc::new(Mutex::new(None)),
            active: Arc::new(RwLock::new(None)),
            actor_init: Arc::new(Mutex::new(false)),
        }
    }

    /// Replace the running listener with one for `config`.
    ///
    /// Waits until the old listener has released its port and the new one is
    /// bound (or failed). Calls from any number of tasks are applied strictly
    /// one after the other.
    ///
    /// # Returns
    ///
    /// The port actually bound.
    ///
    /// # Errors
    ///
    /// * [`ServerError::InvalidPort`] / [`ServerError::Bind`] - The new listener
    ///   could not start; nothing is bound afterwards
    /// * [`ServerError::Coordinator`] - The actor is gone
    pub async fn apply_config(&self, config: ServerConfig) -> Result<u16, ServerError> {
        let (reply, reply_rx) = oneshot::channel();
        self.send(CoordinatorCommand::ApplyConfig { config, reply })
            .await?;

        reply_rx.await.map_err(|e| ServerError::Coordinator {
            message: format!("Coordinator dropped apply request: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })?
    }

    /// Stop the active listener, if any. Used on quit.
    pub async fn shutdown(&self) -> Result<(), ServerError> {
        let (reply, reply_rx) = oneshot::channel();
        self.send(CoordinatorCommand::Shutdown { reply }).await?;

        reply_rx.await.map_err(|e| ServerError::Coordinator {
            message: format!("Coordinator dropped shutdown request: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    /// The listener currently bound, if any.
    pub async fn active(&self) -> Option<ActiveListener> {
        self.active.read().await.clone()
    }

    pub fn status(&self) -> &StatusSink {
        self.server.status()
    }

    pub fn current_status(&self) -> ServerStatus {
        self.server.status().current()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<ServerStatus> {
        self.server.status().subscribe()
    }

    async fn send(&self, cmd: CoordinatorCommand) -> Result<(), ServerError> {
        self.ensure_actor().await;

        let tx_guard = self.command_tx.lock().await;
        let tx = tx_guard.as_ref().ok_or_else(|| ServerError::Coordinator {
            message: "Coordinator actor not initialized".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })?;

        tx.send(cmd).await.map_err(|e| ServerError::Coordinator {
            message: format!("Coordinator actor died: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    async fn ensure_actor(&self) {
        let mut init_guard = self.actor_init.lock().await;
        if !*init_guard {
            let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);

            // Store tx BEFORE spawning to avoid race
            let mut tx_guard = self.command_tx.lock().await;
            *tx_guard = Some(tx);
            drop(tx_guard);

            tokio::spawn(coordinator_actor(
                rx,
                Arc::clone(&self.server),
                Arc::clone(&self.active),
            ));
            *init_guard = true;
            info!("Coordinator actor spawned");
        }
    }
}

/// The coordinator actor task.
///
/// Owns the only [`ServerHandle`]. Every command stops the current handle and
/// waits for its port to be released before doing anything else.
async fn coordinator_actor(
    mut command_rx: mpsc::Receiver<CoordinatorCommand>,
    server: Arc<ControlServer>,
    active: Arc<RwLock<Option<ActiveListener>>>,
) {
    info!("Coordinator actor started");

    let mut handle: Option<ServerHandle> = None;

    while let Some(cmd) = command_rx.recv().await {
        match cmd {
            CoordinatorCommand::ApplyConfig { config, reply } => {
                release(&server, &active, &mut handle).await;

                let outcome = match server.start(&config).await {
                    Ok(new_handle) => {
                        let port = new_handle.port();
                        info!("Applied config: port {port}, script {}", config.script_path);
                        *active.write().await = Some(ActiveListener { config, port });
                        handle = Some(new_handle);
                        Ok(port)
                    }
                    Err(e) => {
                        error!("Failed to apply config: {e}");
                        Err(e)
                    }
                };

                if reply.send(outcome).is_err() {
                    warn!("Apply requester went away before the result was ready");
                }
            }
            CoordinatorCommand::Shutdown { reply } => {
                release(&server, &active, &mut handle).await;
                let _ = reply.send(());
            }
        }
    }

    release(&server, &active, &mut handle).await;
    info!("Coordinator actor stopped");
}

async fn release(
    server: &ControlServer,
    active: &RwLock<Option<ActiveListener>>,
    handle: &mut Option<ServerHandle>,
) {
    *active.write().await = None;
    server.stop(handle.take()).await;
}
