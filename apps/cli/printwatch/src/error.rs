use common::ErrorLocation;

use moonraker_core::error::CoreError;

use std::panic::Location;

use thiserror::Error;

/// Errors that end the monitor process.
#[derive(Debug, Error)]
pub enum PrintwatchError {
    /// Error from this app (logger, arguments)
    #[error("Printwatch Error: {message} {location}")]
    Printwatch {
        message: String,
        location: ErrorLocation,
    },

    /// Error from moonraker-core (config, session startup)
    #[error("Core Error: {message} {location}")]
    Core {
        message: String,
        location: ErrorLocation,
    },

    /// Signal handler could not be installed
    #[error("Signal Error: {message} {location}")]
    Signal {
        message: String,
        location: ErrorLocation,
    },
}

impl From<CoreError> for PrintwatchError {
    #[track_caller]
    fn from(error: CoreError) -> Self {
        PrintwatchError::Core {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
