use common::{ErrorLocation, HttpStatusCode};

use std::panic::Location;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum HttpClientError {
    #[error("HTTP Error: {message} {location}")]
    Http {
        message: String,
        location: ErrorLocation,
    },

    #[error("JSON Error: {message} {location}")]
    Json {
        message: String,
        location: ErrorLocation,
    },

    #[error("URL Parse Error: {message} {location}")]
    UrlParse {
        message: String,
        location: ErrorLocation,
    },

    #[error("Server Error: HTTP {status} - {message} {location}")]
    Server {
        status: HttpStatusCode,
        message: String,
        location: ErrorLocation,
    },

    #[error("Unreachable Error: backend answered HTTP {status} {location}")]
    Unreachable {
        status: HttpStatusCode,
        location: ErrorLocation,
    },

    #[error("Token Missing Error: {message} {location}")]
    TokenMissing {
        message: String,
        location: ErrorLocation,
    },
}

impl From<url::ParseError> for HttpClientError {
    #[track_caller]
    fn from(error: url::ParseError) -> Self {
        HttpClientError::UrlParse {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<reqwest::Error> for HttpClientError {
    #[track_caller]
    fn from(error: reqwest::Error) -> Self {
        HttpClientError::Http {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<serde_json::Error> for HttpClientError {
    #[track_caller]
    fn from(error: serde_json::Error) -> Self {
        HttpClientError::Json {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
