//! Inbound frame classification.
//!
//! Moonraker interleaves responses to our requests with unsolicited
//! notifications on the same socket. A frame with a non-null `id` is a
//! response and goes to the correlator; a frame whose `method` is
//! `notify_status_update` goes to the status merger. Everything else is
//! logged and dropped. Nothing here is ever fatal to the session.

use crate::STATUS_UPDATE_METHOD;
use crate::merger::StatusMerger;

use models::RpcResponse;

use std::sync::Arc;

use log::{debug, warn};
use serde::Deserialize;
use tokio::sync::mpsc;

/// What [`MessageRouter::route`] did with a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Delivered (or offered) to the correlator.
    Response(u64),
    /// Handed to the status merger.
    StatusUpdate,
    /// Valid JSON we have no use for.
    Ignored,
    /// Not parseable as a response or notification.
    Malformed,
}

#[derive(Debug, Default, Deserialize)]
struct IdProbe {
    #[serde(default)]
    id: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct MethodProbe {
    #[serde(default)]
    method: Option<String>,
}

#[derive(Clone)]
pub struct MessageRouter {
    responses: mpsc::Sender<RpcResponse>,
    merger: Arc<StatusMerger>,
}

impl MessageRouter {
    pub fn new(responses: mpsc::Sender<RpcResponse>, merger: Arc<StatusMerger>) -> Self {
        Self { responses, merger }
    }

    /// Classify one text frame and forward it.
    ///
    /// Response delivery awaits channel capacity, so a stalled correlator
    /// applies backpressure to the receive loop.
    pub async fn route(&self, frame: &str) -> RouteOutcome {
        let id_probe = serde_json::from_str::<IdProbe>(frame).unwrap_or_else(|e| {
            debug!("Frame has no usable id: {e}");
            IdProbe::default()
        });

        if let Some(id) = id_probe.id {
            let response = match serde_json::from_str::<RpcResponse>(frame) {
                Ok(response) => response,
                Err(e) => {
                    warn!("Dropping malformed response {id}: {e}");
                    return RouteOutcome::Malformed;
                }
            };

            if self.responses.send(response).await.is_err() {
                warn!("No correlator listening, dropping response {id}");
            }
            return RouteOutcome::Response(id);
        }

        let method_probe = match serde_json::from_str::<MethodProbe>(frame) {
            Ok(probe) => probe,
            Err(e) => {
                warn!("Dropping unparseable frame: {e}");
                return RouteOutcome::Malformed;
            }
        };

        match method_probe.method.as_deref() {
            Some(STATUS_UPDATE_METHOD) => {
                debug!("Got a status update");
                self.merger.apply(frame);
                RouteOutcome::StatusUpdate
            }
            Some(other) => {
                debug!("Ignoring notification {other}");
                RouteOutcome::Ignored
            }
            None => {
                warn!("Dropping frame with neither id nor method");
                RouteOutcome::Ignored
            }
        }
    }
}
