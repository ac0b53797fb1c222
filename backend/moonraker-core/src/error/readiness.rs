use crate::error::rpc::RpcError;

use common::ErrorLocation;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum ReadinessError {
    #[error("Not Ready Error: klippy_connected={connected} klippy_state={state} {location}")]
    NotReady {
        connected: bool,
        state: String,
        location: ErrorLocation,
    },

    #[error("Startup Exhausted Error: Klippy still in startup after {attempts} attempts {location}")]
    StartupExhausted {
        attempts: u32,
        location: ErrorLocation,
    },

    #[error("Decode Error: {message} {location}")]
    Decode {
        message: String,
        location: ErrorLocation,
    },

    #[error(transparent)]
    Rpc(#[from] RpcError),
}
