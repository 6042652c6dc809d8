pub mod config;
pub mod reclaim;
pub mod server;
pub mod trigger;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Server(#[from] server::ServerError),

    #[error(transparent)]
    Reclaim(#[from] reclaim::ReclaimError),

    #[error(transparent)]
    Trigger(#[from] trigger::TriggerError),
}
