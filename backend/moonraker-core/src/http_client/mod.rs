use crate::error::http_client::HttpClientError;
use crate::{MOONRAKER_ONESHOT_TOKEN_ENDPOINT, USER_AGENT};

use common::{ErrorLocation, HttpStatusCode, RedactedToken};

use std::panic::Location;
use std::time::Duration;

use log::{debug, info};
use reqwest::Client;
use serde_json::Value;
use url::Url;

pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Plain HTTP side of Moonraker: the reachability probe and oneshot tokens.
#[derive(Clone)]
pub struct MoonrakerHttpClient {
    base_url: Url,
    client: Client,
}

impl MoonrakerHttpClient {
    /// Build a client for `authority` (`host:port`).
    pub fn new(authority: &str, timeout: Duration) -> Result<Self, HttpClientError> {
        let base_url = Url::parse(&format!("http://{authority}/"))?;
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// GET the backend root and require HTTP 200.
    ///
    /// # Errors
    ///
    /// Returns [`HttpClientError::Http`] if the request fails and
    /// [`HttpClientError::Unreachable`] for any status other than 200.
    pub async fn check_reachable(&self) -> Result<HttpStatusCode, HttpClientError> {
        let response = self.client.get(self.base_url.clone()).send().await?;
        let status = HttpStatusCode::from(response.status().as_u16());

        info!("Got response code {status} from {}", self.base_url);

        if !status.is_ok() {
            return Err(HttpClientError::Unreachable {
                status,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(status)
    }

    /// Request a single-use token for the socket upgrade.
    ///
    /// Moonraker answers `{"result": "<token>"}`. A non-string `result` is
    /// used in its JSON text form.
    ///
    /// # Errors
    ///
    /// - [`HttpClientError::Http`] / [`HttpClientError::Json`] on transport or body failures
    /// - [`HttpClientError::Server`] on a non-2xx status
    /// - [`HttpClientError::TokenMissing`] if `result` is absent or null
    pub async fn fetch_oneshot_token(&self) -> Result<RedactedToken, HttpClientError> {
        let url = self.base_url.join(MOONRAKER_ONESHOT_TOKEN_ENDPOINT)?;

        let response = self.client.get(url).send().await?;
        let status = HttpStatusCode::from(response.status().as_u16());

        if !status.is_success() {
            return Err(HttpClientError::Server {
                status,
                message: response.text().await.unwrap_or_default(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let body: Value = serde_json::from_slice(&response.bytes().await?)?;

        let token = match body.get("result") {
            None | Some(Value::Null) => {
                return Err(HttpClientError::TokenMissing {
                    message: String::from("oneshot_token response has no result"),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
            Some(Value::String(token)) => RedactedToken::new(token.as_str()),
            Some(other) => RedactedToken::new(other.to_string()),
        };

        debug!("Got oneshot token ({} chars)", token.len());
        Ok(token)
    }
}
