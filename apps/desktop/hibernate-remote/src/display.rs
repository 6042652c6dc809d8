//! Operator-facing status line.

use control_core::server::ServerStatus;

use log::info;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Log every status change until the status channel closes.
///
/// The current value is shown immediately, so a display attached late still
/// starts with the right line.
pub fn spawn_status_display(mut status_rx: watch::Receiver<ServerStatus>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let status = status_rx.borrow_and_update().clone();
            info!("Status: {status}");

            if status_rx.changed().await.is_err() {
                break;
            }
        }
    })
}
