//! Moonraker session client.
//!
//! Authenticates with a oneshot token, holds a JSON-RPC WebSocket to the
//! backend, waits for Klippy to report ready, subscribes to print status and
//! folds every `notify_status_update` into a running snapshot.
//!
//! Startup runs in this order (see [`session::MoonrakerSession::start`]):
//! reachability probe, token, socket, `server.info` handshake,
//! `printer.objects.subscribe`.

pub mod config;
pub mod correlator;
pub mod error;
pub mod http_client;
pub mod merger;
pub mod readiness;
pub mod router;
pub mod session;
pub mod subscription;
pub mod transport;

#[cfg(test)]
mod tests;

pub const MOONRAKER_ONESHOT_TOKEN_ENDPOINT: &str = "access/oneshot_token";
pub const MOONRAKER_WEBSOCKET_ENDPOINT: &str = "/websocket";

pub const SERVER_INFO_METHOD: &str = "server.info";
pub const PRINTER_OBJECTS_SUBSCRIBE_METHOD: &str = "printer.objects.subscribe";
pub const STATUS_UPDATE_METHOD: &str = "notify_status_update";

pub const USER_AGENT: &str = const_format::concatcp!("printwatch/", env!("CARGO_PKG_VERSION"));
