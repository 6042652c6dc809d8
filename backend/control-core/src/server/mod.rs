//! Embedded HTTP control server.
//!
//! Serves two routes on `0.0.0.0:<port>`:
//!
//! - `GET /` - the control page with a single hibernate button
//! - `GET /do` - the action endpoint; debounced, then schedules the script
//!
//! # Lifecycle
//!
//! [`ControlServer::start`] reclaims the port, binds, and spawns the serve loop
//! on its own task. [`ControlServer::stop`] closes a handle and waits for the
//! port to be released. Every transition is published to the [`StatusSink`].
//!
//! A panic inside one request is turned into a 500 for that request only; the
//! listener keeps serving.

mod handle;
pub mod pages;
pub(crate) mod routes;
mod status;

pub use handle::ServerHandle;
pub use status::{ServerStatus, StatusSink};

use crate::config::ServerConfig;
use crate::debounce::LastAction;
use crate::error::server::ServerError;
use crate::locator::get_local_address;
use crate::reclaim::PortReclaimer;
use crate::server::routes::{RouteState, build_router};
use crate::trigger::TriggerScheduler;
use crate::{ACTION_COOLDOWN, BIND_HOSTNAME};

use common::ErrorLocation;

use std::net::SocketAddr;
use std::panic::Location;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::net::TcpListener;
use tokio::spawn as TokioSpawn;
use tokio::sync::oneshot;
use tokio::task::spawn_blocking;

/// Owns everything that outlives a single listener: the port reclaimer, the
/// trigger scheduler, the last-action timestamp and the status sink.
#[derive(Debug)]
pub struct ControlServer {
    reclaimer: Arc<dyn PortReclaimer>,
    scheduler: TriggerScheduler,
    last_action: Arc<LastAction>,
    status: StatusSink,
}

impl ControlServer {
    pub fn new(reclaimer: Arc<dyn PortReclaimer>, scheduler: TriggerScheduler) -> Self {
        Self {
            reclaimer,
            scheduler,
            last_action: Arc::new(LastAction::new(ACTION_COOLDOWN)),
            status: StatusSink::new(),
        }
    }

    /// Replace the trigger cooldown. Resets the last-action timestamp.
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.last_action = Arc::new(LastAction::new(cooldown));
        self
    }

    pub fn status(&self) -> &StatusSink {
        &self.status
    }

    pub fn last_action(&self) -> &LastAction {
        &self.last_action
    }

    /// Bring up a listener for `config`.
    ///
    /// Reclaims the port first (best effort), then binds `0.0.0.0:<port>` and
    /// spawns the serve loop. Publishes `Binding`, then `Listening` or `Failed`.
    ///
    /// # Errors
    ///
    /// * [`ServerError::InvalidPort`] - The port literal is not a valid port
    /// * [`ServerError::Bind`] - The port could not be bound
    pub async fn start(&self, config: &ServerConfig) -> Result<ServerHandle, ServerError> {
        let location = ErrorLocation::from(Location::caller());

        let port = match config.port_number() {
            Ok(port) => port,
            Err(e) => {
                let err = ServerError::InvalidPort {
                    message: e.to_string(),
                    location,
                };
                self.report_failure(format!("invalid port '{}'", config.port));
                return Err(err);
            }
        };

        self.status.publish(ServerStatus::Binding { port });

        if port != 0 {
            self.reclaim_port(port).await;
        }

        let address = format!("{BIND_HOSTNAME}:{port}");
        let listener = match TcpListener::bind(&address).await {
            Ok(listener) => listener,
            Err(e) => {
                error!("Failed to bind {address}: {e}");
                self.report_failure(format!("cannot listen on port {port}: {e}"));
                return Err(ServerError::Bind {
                    message: format!("Failed to bind {address}: {e}"),
                    location,
                    source: e,
                });
            }
        };

        let local_addr = match listener.local_addr() {
            Ok(addr) => addr,
            Err(e) => {
                self.report_failure(format!("cannot read bound address: {e}"));
                return Err(ServerError::Bind {
                    message: format!("Failed to read local address of {address}: {e}"),
                    location,
                    source: e,
                });
            }
        };

        let router = build_router(RouteState {
            last_action: Arc::clone(&self.last_action),
            scheduler: self.scheduler,
            script_path: Arc::new(PathBuf::from(&config.script_path)),
        });

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let task = TokioSpawn(async move {
            let result = axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await;

            match result {
                Ok(()) => info!("Control server on {local_addr} shut down"),
                Err(e) => error!("Control server on {local_addr} failed: {e}"),
            }
        });

        info!(
            "Control server listening on {local_addr}, script {}",
            config.script_path
        );

        self.status.publish(ServerStatus::Listening {
            address: get_local_address(),
            port: local_addr.port(),
        });

        Ok(ServerHandle::new(local_addr, shutdown_tx, task))
    }

    /// Close `handle` and wait for its port to be released.
    ///
    /// A `None` handle is a no-op. Already-scheduled triggers are not cancelled.
    pub async fn stop(&self, handle: Option<ServerHandle>) {
        let Some(handle) = handle else {
            debug!("Stop requested but no listener is active");
            return;
        };

        let port = handle.port();
        self.status.publish(ServerStatus::Closing { port });
        handle.close().await;
        self.status.publish(ServerStatus::Stopped);
    }

    async fn reclaim_port(&self, port: u16) {
        let reclaimer = Arc::clone(&self.reclaimer);

        match spawn_blocking(move || reclaimer.reclaim(port)).await {
            Ok(Ok(0)) => debug!("Port {port} was free"),
            Ok(Ok(stopped)) => info!("Reclaimed port {port} from {stopped} process(es)"),
            Ok(Err(e)) => warn!("Port reclaim failed, binding anyway: {e}"),
            Err(e) => warn!("Port reclaim task failed, binding anyway: {e}"),
        }
    }

    fn report_failure(&self, reason: String) {
        self.status.publish(ServerStatus::Failed { reason });
    }
}
