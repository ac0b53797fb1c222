use common::ErrorLocation;

use std::panic::Location;
use std::time::Duration;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum RpcError {
    #[error("RPC Timeout Error: no response to {method} (id {id}) within {waited:?} {location}")]
    Timeout {
        method: String,
        id: u64,
        waited: Duration,
        location: ErrorLocation,
    },

    #[error("Connection Closed Error: socket closed while waiting for {method} (id {id}) {location}")]
    ConnectionClosed {
        method: String,
        id: u64,
        location: ErrorLocation,
    },

    #[error("Remote Error: {method} failed with code {code}: {message} {location}")]
    Remote {
        method: String,
        code: i64,
        message: String,
        location: ErrorLocation,
    },

    #[error("Encode Error: {message} {location}")]
    Encode {
        message: String,
        location: ErrorLocation,
    },
}

impl From<serde_json::Error> for RpcError {
    #[track_caller]
    fn from(error: serde_json::Error) -> Self {
        RpcError::Encode {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
