//! HTTP status code classification for backend probes.

/// HTTP status code returned by the Moonraker HTTP endpoints.
///
/// Stored directly so errors can report the exact code the backend sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpStatusCode(pub u16);

impl HttpStatusCode {
    /// 2xx responses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.0)
    }

    /// Exactly 200, the only code the reachability probe accepts.
    pub fn is_ok(&self) -> bool {
        self.0 == 200
    }
}

impl From<u16> for HttpStatusCode {
    fn from(code: u16) -> Self {
        HttpStatusCode(code)
    }
}

impl std::fmt::Display for HttpStatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
