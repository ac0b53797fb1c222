//! `server.info` readiness handshake.
//!
//! Klippy needs a few seconds to finish booting after Moonraker comes up, so a
//! "startup" report gets a bounded number of delayed retries. The transition
//! table lives in [`ReadinessState::next`]; [`await_ready`] only performs the
//! I/O each state asks for.
//!
//! ```text
//! Connecting --InfoRequested--> AwaitingInfo{1}
//! AwaitingInfo{n} --ready--> Ready
//! AwaitingInfo{n} --startup, n <= retries--> StartupRetry{n} --delay--> AwaitingInfo{n+1}
//! AwaitingInfo{n} --anything else--> Failed
//! ```

use crate::SERVER_INFO_METHOD;
use crate::correlator::Correlator;
use crate::error::readiness::ReadinessError;
use crate::transport::FrameSink;

use models::KlippyReadiness;

use common::ErrorLocation;

use std::panic::Location;
use std::time::Duration;

use log::{debug, info, warn};

pub const DEFAULT_STARTUP_RETRY_DELAY: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_STARTUP_RETRIES: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    pub startup_retry_delay: Duration,
    pub max_startup_retries: u32,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            startup_retry_delay: DEFAULT_STARTUP_RETRY_DELAY,
            max_startup_retries: DEFAULT_MAX_STARTUP_RETRIES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadinessFailure {
    NotReady(KlippyReadiness),
    StartupExhausted { attempts: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadinessState {
    Connecting,
    AwaitingInfo { attempt: u32 },
    StartupRetry { attempt: u32 },
    Ready(KlippyReadiness),
    Failed(ReadinessFailure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadinessEvent {
    InfoRequested,
    RetryDelayElapsed,
    InfoReceived(KlippyReadiness),
}

impl ReadinessState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReadinessState::Ready(_) | ReadinessState::Failed(_))
    }

    /// Transition table. Events that do not apply to a state leave it unchanged.
    pub fn next(self, event: ReadinessEvent, policy: &ReadinessPolicy) -> ReadinessState {
        match (self, event) {
            (ReadinessState::Connecting, ReadinessEvent::InfoRequested) => {
                ReadinessState::AwaitingInfo { attempt: 1 }
            }
            (ReadinessState::StartupRetry { attempt }, ReadinessEvent::RetryDelayElapsed) => {
                ReadinessState::AwaitingInfo {
                    attempt: attempt + 1,
                }
            }
            (ReadinessState::AwaitingInfo { .. }, ReadinessEvent::InfoReceived(report))
                if report.is_ready() =>
            {
                ReadinessState::Ready(report)
            }
            (ReadinessState::AwaitingInfo { attempt }, ReadinessEvent::InfoReceived(report))
                if report.is_starting_up() =>
            {
                if attempt <= policy.max_startup_retries {
                    ReadinessState::StartupRetry { attempt }
                } else {
                    ReadinessState::Failed(ReadinessFailure::StartupExhausted { attempts: attempt })
                }
            }
            (ReadinessState::AwaitingInfo { .. }, ReadinessEvent::InfoReceived(report)) => {
                ReadinessState::Failed(ReadinessFailure::NotReady(report))
            }
            (state, _) => state,
        }
    }
}

/// Drive the handshake until Klippy is connected and ready.
///
/// RPC and decode failures end the handshake immediately.
///
/// # Errors
///
/// - [`ReadinessError::NotReady`] for any report other than ready/startup
/// - [`ReadinessError::StartupExhausted`] if Klippy stays in startup past the retries
/// - [`ReadinessError::Decode`] if the `server.info` result has the wrong shape
/// - [`ReadinessError::Rpc`] on correlator failures (timeout, closed socket)
pub async fn await_ready<S: FrameSink>(
    correlator: &mut Correlator<S>,
    policy: &ReadinessPolicy,
) -> Result<KlippyReadiness, ReadinessError> {
    let mut state = ReadinessState::Connecting;

    loop {
        state = match state {
            ReadinessState::Connecting => state.next(ReadinessEvent::InfoRequested, policy),
            ReadinessState::AwaitingInfo { attempt } => {
                debug!("Requesting {SERVER_INFO_METHOD} (attempt {attempt})");
                let report = query_server_info(correlator).await?;
                state.next(ReadinessEvent::InfoReceived(report), policy)
            }
            ReadinessState::StartupRetry { attempt } => {
                info!(
                    "Klippy in startup (attempt {attempt}), checking again in {}s",
                    policy.startup_retry_delay.as_secs()
                );
                tokio::time::sleep(policy.startup_retry_delay).await;
                state.next(ReadinessEvent::RetryDelayElapsed, policy)
            }
            ReadinessState::Ready(report) => {
                info!("Klippy connected & ready");
                return Ok(report);
            }
            ReadinessState::Failed(failure) => {
                warn!("Readiness handshake failed: {:?}", failure);
                return Err(failure_error(failure));
            }
        };
    }
}

async fn query_server_info<S: FrameSink>(
    correlator: &mut Correlator<S>,
) -> Result<KlippyReadiness, ReadinessError> {
    let result = correlator.issue(SERVER_INFO_METHOD, None).await?;

    serde_json::from_value(result).map_err(|e| ReadinessError::Decode {
        message: format!("Invalid {SERVER_INFO_METHOD} result: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })
}

fn failure_error(failure: ReadinessFailure) -> ReadinessError {
    match failure {
        ReadinessFailure::NotReady(report) => ReadinessError::NotReady {
            connected: report.connected,
            state: report.state.to_string(),
            location: ErrorLocation::from(Location::caller()),
        },
        ReadinessFailure::StartupExhausted { attempts } => ReadinessError::StartupExhausted {
            attempts,
            location: ErrorLocation::from(Location::caller()),
        },
    }
}
