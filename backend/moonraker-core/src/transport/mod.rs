//! WebSocket transport to Moonraker.
//!
//! One socket per session, split into a write half guarded by a mutex and a
//! read half owned by a dedicated receive task:
//!
//! - Every inbound text frame is handed to the [`MessageRouter`]
//! - The receive task only ends when the socket closes or errors
//! - On exit it flips a `watch` close signal that every consumer can await
//!
//! # Protocol
//!
//! JSON-RPC 2.0 text frames at `ws://<authority>/websocket?token=<oneshot>`.
//! Closing sends a close frame with the normal-closure code (1000).

use crate::MOONRAKER_WEBSOCKET_ENDPOINT;
use crate::error::transport::TransportError;
use crate::router::MessageRouter;

use common::{ErrorLocation, RedactedToken};

use std::future::Future;
use std::panic::Location;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::Utf8Bytes;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Anything a JSON-RPC request can be written to.
///
/// Implemented by [`WsTransport`]; the correlator only depends on this seam.
pub trait FrameSink: Send + Sync {
    fn send_json(&self, frame: &Value) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// Build `ws://<authority>/websocket?token=<token>`.
pub fn websocket_url(authority: &str, token: &RedactedToken) -> Result<Url, TransportError> {
    let mut url = Url::parse(&format!("ws://{authority}{MOONRAKER_WEBSOCKET_ENDPOINT}"))?;
    url.query_pairs_mut().append_pair("token", token.expose());
    Ok(url)
}

/// Write half of the session socket plus its close signal.
pub struct WsTransport {
    writer: Mutex<SplitSink<WsStream, Message>>,
    closed: watch::Receiver<bool>,
}

impl WsTransport {
    /// Open the socket and start the receive task.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Connect`] if the TCP connect or the WebSocket
    /// upgrade fails (an expired token is rejected during the upgrade).
    pub async fn connect(
        url: &Url,
        router: MessageRouter,
    ) -> Result<(Self, JoinHandle<()>), TransportError> {
        let (ws_stream, _response) =
            connect_async(url.as_str())
                .await
                .map_err(|e| TransportError::Connect {
                    message: format!(
                        "WebSocket connect to {}{} failed: {e}",
                        url.host_str().unwrap_or("unknown"),
                        url.path()
                    ),
                    location: ErrorLocation::from(Location::caller()),
                })?;

        let (writer, reader) = ws_stream.split();
        let (closed_tx, closed_rx) = watch::channel(false);

        let receive_task = tokio::spawn(receive_loop(reader, router, closed_tx));

        Ok((
            Self {
                writer: Mutex::new(writer),
                closed: closed_rx,
            },
            receive_task,
        ))
    }

    /// Send a close frame with the normal-closure code.
    ///
    /// Does not wait for the peer; await [`WsTransport::closed`] for that.
    pub async fn close(&self) -> Result<(), TransportError> {
        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: Utf8Bytes::from_static(""),
        };

        self.writer
            .lock()
            .await
            .send(Message::Close(Some(frame)))
            .await
            .map_err(|e| TransportError::Send {
                message: format!("Failed to send close frame: {e}"),
                location: ErrorLocation::from(Location::caller()),
            })
    }

    /// Resolves once the receive task has finished.
    pub async fn closed(&self) {
        let mut closed = self.closed.clone();
        // A dropped sender means the task is gone, which is also closed.
        let _ = closed.wait_for(|is_closed| *is_closed).await;
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }
}

impl FrameSink for WsTransport {
    async fn send_json(&self, frame: &Value) -> Result<(), TransportError> {
        let text = serde_json::to_string(frame)?;

        self.writer
            .lock()
            .await
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| TransportError::Send {
                message: format!("Failed to send frame: {e}"),
                location: ErrorLocation::from(Location::caller()),
            })
    }
}

/// Read frames until the socket ends, then signal close.
async fn receive_loop(
    mut reader: SplitStream<WsStream>,
    router: MessageRouter,
    closed_tx: watch::Sender<bool>,
) {
    while let Some(frame) = reader.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                router.route(text.as_str()).await;
            }
            Ok(Message::Binary(data)) => match std::str::from_utf8(&data) {
                Ok(text) => {
                    router.route(text).await;
                }
                Err(e) => warn!("Dropping non UTF-8 binary frame: {e}"),
            },
            Ok(Message::Close(frame)) => {
                info!("Server closed connection: {:?}", frame);
            }
            Ok(_) => {
                // Ping/pong are answered by tungstenite
            }
            Err(e) => {
                error!("WebSocket read error: {e}");
                break;
            }
        }
    }

    debug!("Receive loop finished");
    closed_tx.send_replace(true);
}
