//! Wire and status data for the Moonraker client.
//!
//! This crate contains pure data structures: JSON-RPC envelopes, the Klippy
//! readiness report, the partial status delta pushed by
//! `notify_status_update`, and the merged printer status snapshot. Models
//! carry no I/O; the session logic lives in `moonraker-core`.

pub mod klippy;
pub mod rpc;
pub mod status;

pub use klippy::{KlippyReadiness, KlippyState};
pub use rpc::{
    JSONRPC_VERSION, ObjectSubscription, RpcErrorObject, RpcRequest, RpcResponse,
    StatusNotification,
};
pub use status::delta::{PrintStatsDelta, PrintStatsInfoDelta, StatusDelta, VirtualSdcardDelta};
pub use status::snapshot::{Hhmmss, PrinterStatusSnapshot};
