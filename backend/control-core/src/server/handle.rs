//! Ownership of one running control listener.

use std::net::SocketAddr;
use std::time::Duration;

use log::{debug, warn};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::timeout;

/// How long in-flight requests get to finish before the serve task is aborted.
const CLOSE_GRACE_PERIOD: Duration = Duration::from_secs(2);

/// Handle to a running control listener.
///
/// Returned by [`ControlServer::start`](crate::server::ControlServer::start).
/// The listener keeps serving until [`close`](ServerHandle::close) is called;
/// dropping the handle without closing also signals shutdown but does not
/// wait for the port to be released.
#[derive(Debug)]
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ServerHandle {
    pub(crate) fn new(
        local_addr: SocketAddr,
        shutdown_tx: oneshot::Sender<()>,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            local_addr,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        }
    }

    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting, let in-flight requests finish, and release the port.
    ///
    /// Returns once the listening socket is closed. Requests still running
    /// after the grace period are cut off.
    pub async fn close(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        let Some(mut task) = self.task.take() else {
            return;
        };

        match timeout(CLOSE_GRACE_PERIOD, &mut task).await {
            Ok(Ok(())) => debug!("Listener on {} closed", self.local_addr),
            Ok(Err(e)) => warn!("Listener task on {} ended abnormally: {e}", self.local_addr),
            Err(_) => {
                warn!(
                    "Listener on {} did not drain within {CLOSE_GRACE_PERIOD:?}, aborting",
                    self.local_addr
                );
                task.abort();
                let _ = task.await;
            }
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
