// Scripted FrameSink shared by the correlator, readiness and subscription tests

use crate::error::transport::TransportError;
use crate::transport::FrameSink;

use models::{RpcErrorObject, RpcResponse};

use common::ErrorLocation;

use std::collections::VecDeque;
use std::panic::Location;
use std::sync::{Arc, Mutex};

use serde_json::{Value, json};
use tokio::sync::mpsc;

/// How the fake backend answers the next request.
pub(crate) enum Reply {
    Result(Value),
    Error { code: i64, message: &'static str },
    /// Never answers.
    Silent,
    /// Answers an unrelated id first, then the real one.
    StaleThen(Value),
    /// The write itself fails.
    SendFails,
}

pub(crate) struct ScriptedSink {
    sent: Mutex<Vec<Value>>,
    replies: Mutex<VecDeque<Reply>>,
    responses: mpsc::Sender<RpcResponse>,
}

impl ScriptedSink {
    pub(crate) fn new(replies: Vec<Reply>) -> (Arc<Self>, mpsc::Receiver<RpcResponse>) {
        let (responses, response_rx) = mpsc::channel(8);
        let sink = Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            replies: Mutex::new(replies.into()),
            responses,
        });
        (sink, response_rx)
    }

    pub(crate) fn sent(&self) -> Vec<Value> {
        self.sent.lock().unwrap().clone()
    }

    pub(crate) fn sent_methods(&self) -> Vec<String> {
        self.sent()
            .iter()
            .map(|frame| frame["method"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    pub(crate) fn sent_ids(&self) -> Vec<u64> {
        self.sent()
            .iter()
            .map(|frame| frame["id"].as_u64().unwrap_or_default())
            .collect()
    }

    async fn respond(&self, id: u64, result: Value, error: Option<RpcErrorObject>) {
        self.responses
            .send(RpcResponse { id, result, error })
            .await
            .unwrap();
    }
}

impl FrameSink for ScriptedSink {
    async fn send_json(&self, frame: &Value) -> Result<(), TransportError> {
        self.sent.lock().unwrap().push(frame.clone());
        let id = frame["id"].as_u64().unwrap_or_default();
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Reply::Silent);

        match reply {
            Reply::Result(result) => self.respond(id, result, None).await,
            Reply::Error { code, message } => {
                let error = RpcErrorObject {
                    code,
                    message: message.to_string(),
                };
                self.respond(id, Value::Null, Some(error)).await
            }
            Reply::Silent => {}
            Reply::StaleThen(result) => {
                self.respond(id + 100, json!("stale"), None).await;
                self.respond(id, result, None).await;
            }
            Reply::SendFails => {
                return Err(TransportError::Send {
                    message: String::from("broken pipe"),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        }

        Ok(())
    }
}

pub(crate) fn klippy_info(connected: bool, state: &str) -> Value {
    json!({
        "klippy_connected": connected,
        "klippy_state": state,
        "components": ["klippy_apis", "file_manager"],
    })
}
