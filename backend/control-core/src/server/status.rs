use crate::CONTROL_URL_SCHEME;

use std::fmt::{Display, Formatter, Result as FormatResult};

use log::debug;
use tokio::sync::watch;

/// Listener lifecycle as shown to the operator.
///
/// Follows `Binding -> Listening -> Closing -> Stopped`, with
/// `Binding -> Failed` when the bind does not succeed. `Ready` is the value
/// before anything was started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerStatus {
    Ready,
    Binding { port: u16 },
    Listening { address: String, port: u16 },
    Closing { port: u16 },
    Stopped,
    Failed { reason: String },
}

impl ServerStatus {
    pub fn is_listening(&self) -> bool {
        matches!(self, ServerStatus::Listening { .. })
    }

    /// URL other devices should open, while listening.
    pub fn url(&self) -> Option<String> {
        match self {
            ServerStatus::Listening { address, port } => {
                Some(format!("{CONTROL_URL_SCHEME}{address}:{port}"))
            }
            _ => None,
        }
    }
}

impl Display for ServerStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        match self {
            ServerStatus::Ready => write!(f, "ready"),
            ServerStatus::Binding { port } => write!(f, "starting on port {port}"),
            ServerStatus::Listening { address, port } => {
                write!(f, "listening: {CONTROL_URL_SCHEME}{address}:{port}")
            }
            ServerStatus::Closing { port } => write!(f, "stopping listener on port {port}"),
            ServerStatus::Stopped => write!(f, "stopped"),
            ServerStatus::Failed { reason } => write!(f, "error: {reason}"),
        }
    }
}

/// Where status updates go. Any number of displays can subscribe.
#[derive(Debug, Clone)]
pub struct StatusSink {
    tx: watch::Sender<ServerStatus>,
}

impl Default for StatusSink {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusSink {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ServerStatus::Ready);
        Self { tx }
    }

    pub fn publish(&self, status: ServerStatus) {
        debug!("Status -> {status}");
        self.tx.send_replace(status);
    }

    pub fn current(&self) -> ServerStatus {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ServerStatus> {
        self.tx.subscribe()
    }
}
