use common::ErrorLocation;

use std::io::Error as IoError;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum TriggerError {
    #[error("Script Spawn Error: {message} {location}")]
    Spawn {
        message: String,
        location: ErrorLocation,
        #[source]
        source: IoError,
    },

    #[error("Script Exit Error: {message} {location}")]
    Exit {
        message: String,
        code: Option<i32>,
        location: ErrorLocation,
    },
}
