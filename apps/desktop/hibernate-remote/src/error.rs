use common::ErrorLocation;

use control_core::error::CoreError;

use thiserror::Error;

/// Errors surfaced by the application shell.
///
/// Core failures are flattened into `Core` with the original message, so the
/// log line reads the same no matter which layer reports it.
#[derive(Debug, Error)]
pub enum AppError {
    /// Error from this App
    #[error("App Error: {message} {location}")]
    App {
        message: String,
        location: ErrorLocation,
    },

    /// Error from control-core operations (config, listener, coordinator)
    #[error("Core Error: {message} {location}")]
    Core {
        message: String,
        location: ErrorLocation,
    },
}

impl AppError {
    /// Wrap any control-core error, recording where the app observed it.
    pub fn core(err: impl Into<CoreError>, location: ErrorLocation) -> Self {
        AppError::Core {
            message: err.into().to_string(),
            location,
        }
    }
}
