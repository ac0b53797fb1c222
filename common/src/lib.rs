//! Shared primitives for the printwatch workspace.
//!
//! This crate holds the small building blocks every other crate leans on:
//! error location tracking, HTTP status classification and the redacted
//! credential wrapper used for Moonraker oneshot tokens.
//!
//! ## Architecture
//!
//! - **common** (this crate): Location tracking, credential handling
//! - **models**: Pure wire and status data structures
//! - **moonraker-core**: Session, transport and correlation logic
//! - **printwatch**: Binary wiring everything together

pub mod error;
pub mod http_status;
pub mod redacted_token;

pub use error::error_location::ErrorLocation;
pub use error::redact_error::RedactError;
pub use http_status::HttpStatusCode;
pub use redacted_token::RedactedToken;
