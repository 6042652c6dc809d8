use common::ErrorLocation;

use std::io::Error as IoError;

use thiserror::Error as ThisError;

/// Failures while bringing a control listener up or handing it over.
#[derive(Debug, ThisError)]
pub enum ServerError {
    #[error("Invalid Port Error: {message} {location}")]
    InvalidPort {
        message: String,
        location: ErrorLocation,
    },

    #[error("Bind Error: {message} {location}")]
    Bind {
        message: String,
        location: ErrorLocation,
        #[source]
        source: IoError,
    },

    #[error("Coordinator Error: {message} {location}")]
    Coordinator {
        message: String,
        location: ErrorLocation,
    },
}
