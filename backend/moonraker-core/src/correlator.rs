//! Request/response pairing over the shared socket.
//!
//! One request is in flight at a time: [`Correlator::issue`] takes `&mut self`,
//! so callers are serialized by the borrow checker. Ids come from a counter
//! owned by the correlator, starting at 1 and strictly increasing for the
//! lifetime of the session.

use crate::error::rpc::RpcError;
use crate::transport::FrameSink;

use models::{RpcRequest, RpcResponse};

use common::ErrorLocation;

use std::panic::Location;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, warn};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::{Instant, timeout_at};

pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Correlator<S: FrameSink> {
    sink: Arc<S>,
    responses: mpsc::Receiver<RpcResponse>,
    next_id: u64,
    timeout: Duration,
}

impl<S: FrameSink> Correlator<S> {
    /// `responses` is the receiving end of the router's response channel.
    pub fn new(sink: Arc<S>, responses: mpsc::Receiver<RpcResponse>, timeout: Duration) -> Self {
        Self {
            sink,
            responses,
            next_id: 1,
            timeout,
        }
    }

    /// Id the next request will carry.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Stop accepting responses once no more requests will be issued.
    ///
    /// Buffered responses stay readable; later deliveries fail immediately,
    /// so the receive loop never waits on a correlator nobody drives.
    pub fn close_responses(&mut self) {
        self.responses.close();
    }

    /// Send `method` and wait for the response carrying the same id.
    ///
    /// Responses with other ids (late answers to timed-out requests) are
    /// logged and discarded. A failed send is logged and the wait still runs,
    /// so it surfaces as a timeout.
    ///
    /// # Errors
    ///
    /// - [`RpcError::Timeout`] if no matching response arrives before the deadline
    /// - [`RpcError::ConnectionClosed`] if the receive loop ended
    /// - [`RpcError::Remote`] if the backend answered with an error object
    /// - [`RpcError::Encode`] if the request could not be serialized
    pub async fn issue(&mut self, method: &str, params: Option<Value>) -> Result<Value, RpcError> {
        let location = ErrorLocation::from(Location::caller());

        let id = self.next_id;
        self.next_id += 1;

        let request = RpcRequest::new(id, method, params);
        let frame = serde_json::to_value(&request)?;

        debug!("Sending {method} (id {id})");
        if let Err(e) = self.sink.send_json(&frame).await {
            error!("Socket send error for {method} (id {id}): {e}");
        }

        let deadline = Instant::now() + self.timeout;

        loop {
            match timeout_at(deadline, self.responses.recv()).await {
                Err(_elapsed) => {
                    warn!("Timed out waiting for {method} (id {id})");
                    return Err(RpcError::Timeout {
                        method: method.to_string(),
                        id,
                        waited: self.timeout,
                        location,
                    });
                }
                Ok(None) => {
                    return Err(RpcError::ConnectionClosed {
                        method: method.to_string(),
                        id,
                        location,
                    });
                }
                Ok(Some(response)) if response.id == id => {
                    debug!("Got response for {method} (id {id})");

                    if let Some(error) = response.error {
                        return Err(RpcError::Remote {
                            method: method.to_string(),
                            code: error.code,
                            message: error.message,
                            location,
                        });
                    }

                    return Ok(response.result);
                }
                Ok(Some(response)) => {
                    warn!(
                        "Discarding response id {} while waiting for {method} (id {id})",
                        response.id
                    );
                }
            }
        }
    }
}
