pub mod config;
pub mod coordinator;
pub mod debounce;
pub mod error;
pub mod locator;
pub mod reclaim;
pub mod server;
pub mod trigger;

#[cfg(test)]
mod tests;

use std::time::Duration;

pub const BIND_HOSTNAME: &str = "0.0.0.0";
pub const LOOPBACK_ADDRESS: &str = "127.0.0.1";
pub const INDEX_ROUTE: &str = "/";
pub const ACTION_ROUTE: &str = "/do";
pub const CONTROL_URL_SCHEME: &str = "http://";

/// Minimum spacing between two accepted triggers.
pub const ACTION_COOLDOWN: Duration = Duration::from_secs(3);

/// Delay between accepting a trigger and running the script.
pub const TRIGGER_DELAY: Duration = Duration::from_secs(1);
