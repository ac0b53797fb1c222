//! A single authenticated Moonraker session.
//!
//! The session owns all mutable client state: the request id counter (inside
//! the [`Correlator`]) and the status snapshot (inside the [`StatusMerger`]).
//! Dropping it without calling [`MoonrakerSession::shutdown`] aborts nothing;
//! the receive task keeps running until the socket closes.

mod options;

pub use options::{DEFAULT_CLOSE_GRACE, SessionOptions};

use crate::MOONRAKER_WEBSOCKET_ENDPOINT;
use crate::config::ServerConfig;
use crate::correlator::Correlator;
use crate::error::CoreError;
use crate::http_client::MoonrakerHttpClient;
use crate::merger::StatusMerger;
use crate::readiness::await_ready;
use crate::router::MessageRouter;
use crate::subscription::subscribe_status;
use crate::transport::{WsTransport, websocket_url};

use models::PrinterStatusSnapshot;

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Responses buffered between the receive loop and the correlator.
const RESPONSE_QUEUE_DEPTH: usize = 16;

pub struct MoonrakerSession {
    transport: Arc<WsTransport>,
    correlator: Correlator<WsTransport>,
    merger: Arc<StatusMerger>,
    receive_task: JoinHandle<()>,
    close_grace: Duration,
}

impl MoonrakerSession {
    /// Run the full startup sequence and return a subscribed session.
    ///
    /// 1. Reachability probe (if enabled)
    /// 2. Oneshot token
    /// 3. WebSocket connect, receive task started
    /// 4. `server.info` readiness handshake
    /// 5. `printer.objects.subscribe`
    ///
    /// # Errors
    ///
    /// Any stage failure is returned as [`CoreError`]; there is no retry of
    /// the sequence. If the socket was already open it is closed first.
    pub async fn start(server: &ServerConfig, options: SessionOptions) -> Result<Self, CoreError> {
        let authority = server.authority();

        let http = MoonrakerHttpClient::new(&authority, options.http_timeout)?;
        if options.probe_reachability {
            http.check_reachable().await?;
        }
        let token = http.fetch_oneshot_token().await?;

        let url = websocket_url(&authority, &token)?;
        drop(token);
        info!("Connecting to ws://{authority}{MOONRAKER_WEBSOCKET_ENDPOINT}");

        let merger = Arc::new(StatusMerger::new());
        let (response_tx, response_rx) = mpsc::channel(RESPONSE_QUEUE_DEPTH);
        let router = MessageRouter::new(response_tx, Arc::clone(&merger));

        let (transport, receive_task) = WsTransport::connect(&url, router).await?;
        let transport = Arc::new(transport);

        let mut session = Self {
            correlator: Correlator::new(Arc::clone(&transport), response_rx, options.rpc_timeout),
            transport,
            merger,
            receive_task,
            close_grace: options.close_grace,
        };

        if let Err(e) = session.handshake(&options).await {
            warn!("Session startup failed, closing socket: {e}");
            session.shutdown().await;
            return Err(e);
        }

        // No requests after the subscription; stray responses must not
        // fill the queue and stall the receive loop.
        session.correlator.close_responses();

        Ok(session)
    }

    async fn handshake(&mut self, options: &SessionOptions) -> Result<(), CoreError> {
        await_ready(&mut self.correlator, &options.readiness).await?;
        subscribe_status(&mut self.correlator, &options.subscription).await?;
        Ok(())
    }

    /// Watch the merged status; woken on every change.
    pub fn status(&self) -> watch::Receiver<PrinterStatusSnapshot> {
        self.merger.subscribe()
    }

    pub fn snapshot(&self) -> PrinterStatusSnapshot {
        self.merger.snapshot()
    }

    /// Resolves when the backend closes the socket or it fails.
    pub async fn closed(&self) {
        self.transport.closed().await
    }

    pub fn is_closed(&self) -> bool {
        self.transport.is_closed()
    }

    /// Graceful close: send a normal-closure frame, wait up to the close grace
    /// for the peer to finish the handshake, then stop the receive task
    /// regardless.
    pub async fn shutdown(self) {
        if !self.transport.is_closed() {
            if let Err(e) = self.transport.close().await {
                debug!("Write close: {e}");
            }

            if tokio::time::timeout(self.close_grace, self.transport.closed())
                .await
                .is_err()
            {
                warn!(
                    "Peer did not acknowledge close within {:?}, tearing down",
                    self.close_grace
                );
            }
        }

        self.receive_task.abort();
        info!("Session closed");
    }
}
