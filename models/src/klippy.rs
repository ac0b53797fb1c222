use serde::Deserialize;

/// Klippy host state as reported by `server.info`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum KlippyState {
    Startup,
    Ready,
    Error,
    Shutdown,
    Disconnected,
    Other(String),
}

impl From<String> for KlippyState {
    fn from(value: String) -> Self {
        match value.as_str() {
            "startup" => KlippyState::Startup,
            "ready" => KlippyState::Ready,
            "error" => KlippyState::Error,
            "shutdown" => KlippyState::Shutdown,
            "disconnected" => KlippyState::Disconnected,
            _ => KlippyState::Other(value),
        }
    }
}

impl std::fmt::Display for KlippyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KlippyState::Startup => write!(f, "startup"),
            KlippyState::Ready => write!(f, "ready"),
            KlippyState::Error => write!(f, "error"),
            KlippyState::Shutdown => write!(f, "shutdown"),
            KlippyState::Disconnected => write!(f, "disconnected"),
            KlippyState::Other(other) => write!(f, "{other}"),
        }
    }
}

/// The subset of the `server.info` result the readiness handshake reads.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KlippyReadiness {
    #[serde(rename = "klippy_connected", default)]
    pub connected: bool,
    #[serde(rename = "klippy_state")]
    pub state: KlippyState,
}

impl KlippyReadiness {
    pub fn is_ready(&self) -> bool {
        self.connected && self.state == KlippyState::Ready
    }

    pub fn is_starting_up(&self) -> bool {
        self.connected && self.state == KlippyState::Startup
    }
}
