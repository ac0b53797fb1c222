//! In-process stand-in for a Moonraker instance.
//!
//! Serves the HTTP endpoints (`/` and `/access/oneshot_token`) and the
//! `/websocket` upgrade on one port, like the real daemon:
//! - `server.info` answers from a scripted list of Klippy states
//! - `printer.objects.subscribe` is answered after an unrelated notification,
//!   then the scripted status notifications are pushed
//! - with `stall_after_subscribe` the peer stops reading after subscribe, so
//!   a client close frame is never acknowledged
//! - every received frame and the client close code are recorded

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

pub const TEST_TOKEN: &str = "oneshot-test-token";

/// What the fake answers.
pub struct Script {
    pub klippy_states: Vec<&'static str>,
    pub notifications: Vec<Value>,
    /// Responses with ids nobody asked for, sent before the notifications.
    pub stray_responses: u64,
    pub stall_after_subscribe: bool,
}

impl Script {
    pub fn ready() -> Self {
        Self {
            klippy_states: vec!["ready"],
            notifications: Vec::new(),
            stray_responses: 0,
            stall_after_subscribe: false,
        }
    }
}

struct AfterSubscribe {
    notifications: Vec<Value>,
    stray_responses: u64,
    stall: bool,
}

#[derive(Default)]
struct Recorded {
    frames: Vec<Value>,
    http_paths: Vec<String>,
    upgrade_line: Option<String>,
    close_code: Option<u16>,
}

pub struct FakeMoonraker {
    pub authority: String,
    recorded: Arc<Mutex<Recorded>>,
    handle: JoinHandle<()>,
}

impl FakeMoonraker {
    pub async fn start(script: Script) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake Moonraker");
        let authority = listener.local_addr().unwrap().to_string();
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        let states = Arc::new(Mutex::new(VecDeque::from(script.klippy_states)));
        let after_subscribe = Arc::new(AfterSubscribe {
            notifications: script.notifications,
            stray_responses: script.stray_responses,
            stall: script.stall_after_subscribe,
        });

        let task_recorded = recorded.clone();
        let handle = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                tokio::spawn(handle_connection(
                    stream,
                    task_recorded.clone(),
                    states.clone(),
                    after_subscribe.clone(),
                ));
            }
        });

        Self {
            authority,
            recorded,
            handle,
        }
    }

    pub fn frames(&self) -> Vec<Value> {
        self.recorded.lock().unwrap().frames.clone()
    }

    pub fn methods(&self) -> Vec<String> {
        self.frames()
            .iter()
            .filter_map(|frame| frame["method"].as_str().map(str::to_string))
            .collect()
    }

    pub fn http_paths(&self) -> Vec<String> {
        self.recorded.lock().unwrap().http_paths.clone()
    }

    pub fn upgrade_line(&self) -> Option<String> {
        self.recorded.lock().unwrap().upgrade_line.clone()
    }

    /// Close code sent by the client, polled for up to a second.
    pub async fn close_code(&self) -> Option<u16> {
        for _ in 0..100 {
            if let Some(code) = self.recorded.lock().unwrap().close_code {
                return Some(code);
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        None
    }
}

impl Drop for FakeMoonraker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn handle_connection(
    stream: TcpStream,
    recorded: Arc<Mutex<Recorded>>,
    states: Arc<Mutex<VecDeque<&'static str>>>,
    after_subscribe: Arc<AfterSubscribe>,
) {
    let request_line = peek_request_line(&stream).await;

    if request_line.starts_with("GET /websocket") {
        recorded.lock().unwrap().upgrade_line = Some(request_line);
        serve_websocket(stream, recorded, states, after_subscribe).await;
    } else {
        serve_http(stream, &request_line, recorded).await;
    }
}

async fn peek_request_line(stream: &TcpStream) -> String {
    let mut buf = [0u8; 1024];
    loop {
        let n = stream.peek(&mut buf).await.unwrap_or(0);
        let text = String::from_utf8_lossy(&buf[..n]).to_string();
        if let Some((line, _)) = text.split_once("\r\n") {
            return line.to_string();
        }
        if n == 0 || n == buf.len() {
            return text;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}

async fn serve_http(mut stream: TcpStream, request_line: &str, recorded: Arc<Mutex<Recorded>>) {
    // Drain the request head; GETs carry no body
    let mut head = Vec::new();
    let mut byte = [0u8; 1];
    while !head.ends_with(b"\r\n\r\n") {
        match stream.read(&mut byte).await {
            Ok(1) => head.push(byte[0]),
            _ => break,
        }
    }

    let path = request_line.split(' ').nth(1).unwrap_or("/").to_string();
    recorded.lock().unwrap().http_paths.push(path.clone());

    let (status, body) = match path.as_str() {
        "/" => ("200 OK", json!({"result": "moonraker"})),
        "/access/oneshot_token" => ("200 OK", json!({"result": TEST_TOKEN})),
        _ => ("404 Not Found", json!({"error": {"code": 404, "message": "Not Found"}})),
    };
    let body = body.to_string();
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );

    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

async fn serve_websocket(
    stream: TcpStream,
    recorded: Arc<Mutex<Recorded>>,
    states: Arc<Mutex<VecDeque<&'static str>>>,
    after_subscribe: Arc<AfterSubscribe>,
) {
    let Ok(mut ws) = accept_async(stream).await else {
        return;
    };

    while let Some(message) = ws.next().await {
        let frame = match message {
            Ok(Message::Text(text)) => match serde_json::from_str::<Value>(text.as_str()) {
                Ok(frame) => frame,
                Err(_) => continue,
            },
            Ok(Message::Close(close)) => {
                recorded.lock().unwrap().close_code = close.map(|frame| u16::from(frame.code));
                continue;
            }
            Ok(_) => continue,
            Err(_) => break,
        };

        recorded.lock().unwrap().frames.push(frame.clone());
        let id = frame["id"].clone();

        let mut outgoing = Vec::new();
        let mut subscribed = false;
        match frame["method"].as_str() {
            Some("server.info") => {
                let state = states.lock().unwrap().pop_front().unwrap_or("ready");
                outgoing.push(json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "result": {
                        "klippy_connected": true,
                        "klippy_state": state,
                        "components": ["klippy_apis"],
                    }
                }));
            }
            Some("printer.objects.subscribe") => {
                outgoing.push(json!({
                    "jsonrpc": "2.0",
                    "method": "notify_proc_stat_update",
                    "params": [{"cpu_temp": 48.2}]
                }));
                outgoing.push(json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "result": {"eventtime": 1.0, "status": {}}
                }));
                outgoing.extend((1..=after_subscribe.stray_responses).map(|n| {
                    json!({"jsonrpc": "2.0", "id": 1000 + n, "result": "late"})
                }));
                outgoing.extend(after_subscribe.notifications.iter().cloned());
                subscribed = true;
            }
            _ => {}
        }

        for reply in outgoing {
            if ws.send(Message::Text(reply.to_string().into())).await.is_err() {
                return;
            }
        }

        if subscribed && after_subscribe.stall {
            // Keep the socket open but never read again
            tokio::time::sleep(Duration::from_secs(3600)).await;
            return;
        }
    }
}

/// `notify_status_update` frame with an event time.
pub fn status_update(delta: Value, event_time: f64) -> Value {
    json!({
        "jsonrpc": "2.0",
        "method": "notify_status_update",
        "params": [delta, event_time],
    })
}
