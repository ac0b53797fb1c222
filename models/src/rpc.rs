//! JSON-RPC 2.0 envelopes exchanged over the Moonraker socket.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

/// Client to server request.
///
/// `params` is omitted from the wire when absent; Moonraker rejects
/// `"params": null` on some methods.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcRequest {
    pub jsonrpc: &'static str,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    pub id: u64,
}

impl RpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method: method.into(),
            params,
            id,
        }
    }
}

/// JSON-RPC error object carried by a failed response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

/// Server to client response, correlated to a request by `id`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RpcResponse {
    pub id: u64,
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

/// Unsolicited notification frame.
///
/// For `notify_status_update`, `params[0]` is the status delta and
/// `params[1]` the backend event time.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusNotification {
    pub method: String,
    #[serde(default)]
    pub params: Vec<Value>,
}

impl StatusNotification {
    pub fn delta(&self) -> Option<&Value> {
        self.params.first()
    }

    pub fn event_time(&self) -> Option<f64> {
        self.params.get(1).and_then(Value::as_f64)
    }
}

/// Params of `printer.objects.subscribe`.
///
/// A `None` field list serializes as `null`, which asks Moonraker for every
/// field of that object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectSubscription {
    pub objects: BTreeMap<String, Option<Vec<String>>>,
}

impl ObjectSubscription {
    pub fn with_object(mut self, name: impl Into<String>, fields: Option<Vec<String>>) -> Self {
        self.objects.insert(name.into(), fields);
        self
    }
}

impl Default for ObjectSubscription {
    /// `virtual_sdcard` and `print_stats`, all fields.
    fn default() -> Self {
        Self {
            objects: BTreeMap::new(),
        }
        .with_object("virtual_sdcard", None)
        .with_object("print_stats", None)
    }
}
