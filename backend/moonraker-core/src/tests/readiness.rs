// Unit tests for the server.info readiness handshake
// Timer-driven cases run on tokio's paused clock

use crate::correlator::{Correlator, DEFAULT_RPC_TIMEOUT};
use crate::error::readiness::ReadinessError;
use crate::error::rpc::RpcError;
use crate::readiness::{
    ReadinessEvent, ReadinessFailure, ReadinessPolicy, ReadinessState, await_ready,
};
use crate::tests::support::{Reply, ScriptedSink, klippy_info};

use models::{KlippyReadiness, KlippyState};

use std::time::Duration;

use serde_json::json;
use tokio::time::Instant;

fn report(connected: bool, state: KlippyState) -> KlippyReadiness {
    KlippyReadiness { connected, state }
}

/// **VALUE**: Verifies a ready report ends the handshake without sleeping.
///
/// **WHY THIS MATTERS**: The common case is a printer that is already up. Any
/// delay here is added to every start of the monitor.
///
/// **BUG THIS CATCHES**: Would catch if the retry delay runs unconditionally or
/// if a second `server.info` is sent after a ready report.
#[tokio::test(start_paused = true)]
async fn given_ready_report_when_awaiting_then_ready_immediately() {
    // GIVEN: Backend reports connected + ready
    let (sink, responses) = ScriptedSink::new(vec![Reply::Result(klippy_info(true, "ready"))]);
    let mut correlator = Correlator::new(sink.clone(), responses, DEFAULT_RPC_TIMEOUT);
    let started = Instant::now();

    // WHEN: Running the handshake
    let result = await_ready(&mut correlator, &ReadinessPolicy::default()).await;

    // THEN: Ready, one request, no time passed
    let readiness = result.expect("handshake should succeed");
    assert!(readiness.is_ready());
    assert_eq!(sink.sent_methods(), vec!["server.info"]);
    assert_eq!(started.elapsed(), Duration::ZERO);
}

/// **VALUE**: Verifies one startup report leads to one 10 second wait and one retry.
///
/// **WHY THIS MATTERS**: Klippy commonly needs a few seconds after boot. The
/// retry keeps the monitor from failing on a printer that is just starting.
///
/// **BUG THIS CATCHES**: Would catch if the retry delay changes, or if the
/// machine polls more than once.
#[tokio::test(start_paused = true)]
async fn given_startup_then_ready_when_awaiting_then_waits_once_and_succeeds() {
    // GIVEN: startup on the first attempt, ready on the second
    let (sink, responses) = ScriptedSink::new(vec![
        Reply::Result(klippy_info(true, "startup")),
        Reply::Result(klippy_info(true, "ready")),
    ]);
    let mut correlator = Correlator::new(sink.clone(), responses, DEFAULT_RPC_TIMEOUT);
    let started = Instant::now();

    // WHEN: Running the handshake
    let result = await_ready(&mut correlator, &ReadinessPolicy::default()).await;

    // THEN: Ready after exactly one 10s delay and two requests
    assert!(result.is_ok(), "Expected ready, got {:?}", result);
    assert_eq!(sink.sent_methods(), vec!["server.info", "server.info"]);
    assert_eq!(sink.sent_ids(), vec![1, 2]);
    assert_eq!(started.elapsed(), Duration::from_secs(10));
}

/// **VALUE**: Verifies two startup reports end in failure after a single retry.
///
/// **WHY THIS MATTERS**: A printer stuck in startup (bad MCU config, missing
/// serial device) must fail the session instead of polling forever.
///
/// **BUG THIS CATCHES**: Would catch if the retry becomes unbounded or if the
/// retry counter is off by one.
#[tokio::test(start_paused = true)]
async fn given_startup_twice_when_awaiting_then_fails_after_one_retry() {
    // GIVEN: startup on both attempts (a third reply exists but must not be used)
    let (sink, responses) = ScriptedSink::new(vec![
        Reply::Result(klippy_info(true, "startup")),
        Reply::Result(klippy_info(true, "startup")),
        Reply::Result(klippy_info(true, "ready")),
    ]);
    let mut correlator = Correlator::new(sink.clone(), responses, DEFAULT_RPC_TIMEOUT);
    let started = Instant::now();

    // WHEN: Running the handshake
    let result = await_ready(&mut correlator, &ReadinessPolicy::default()).await;

    // THEN: StartupExhausted, exactly two requests and one delay
    match result {
        Err(ReadinessError::StartupExhausted { attempts, .. }) => assert_eq!(attempts, 2),
        other => panic!("Expected StartupExhausted, got {:?}", other),
    }
    assert_eq!(sink.sent_methods().len(), 2);
    assert_eq!(started.elapsed(), Duration::from_secs(10));
}

/// **VALUE**: Verifies a disconnected Klippy fails without retrying.
///
/// **BUG THIS CATCHES**: Would catch if the startup retry also applies to
/// `klippy_connected: false`.
#[tokio::test(start_paused = true)]
async fn given_disconnected_report_when_awaiting_then_fails_not_ready() {
    let (sink, responses) =
        ScriptedSink::new(vec![Reply::Result(klippy_info(false, "startup"))]);
    let mut correlator = Correlator::new(sink.clone(), responses, DEFAULT_RPC_TIMEOUT);

    let result = await_ready(&mut correlator, &ReadinessPolicy::default()).await;

    match result {
        Err(ReadinessError::NotReady {
            connected, state, ..
        }) => {
            assert!(!connected);
            assert_eq!(state, "startup");
        }
        other => panic!("Expected NotReady, got {:?}", other),
    }
    assert_eq!(sink.sent_methods().len(), 1);
}

/// **VALUE**: Verifies an error/shutdown state fails immediately.
#[tokio::test(start_paused = true)]
async fn given_error_state_when_awaiting_then_fails_not_ready() {
    let (sink, responses) = ScriptedSink::new(vec![Reply::Result(klippy_info(true, "error"))]);
    let mut correlator = Correlator::new(sink, responses, DEFAULT_RPC_TIMEOUT);

    let result = await_ready(&mut correlator, &ReadinessPolicy::default()).await;

    assert!(matches!(result, Err(ReadinessError::NotReady { .. })));
}

/// **VALUE**: Verifies a correlator timeout ends the handshake with the RPC error.
///
/// **BUG THIS CATCHES**: Would catch if a timeout is mistaken for a startup
/// report and triggers the retry path.
#[tokio::test(start_paused = true)]
async fn given_silent_backend_when_awaiting_then_fails_with_timeout() {
    let (sink, responses) = ScriptedSink::new(vec![Reply::Silent]);
    let mut correlator = Correlator::new(sink.clone(), responses, DEFAULT_RPC_TIMEOUT);

    let result = await_ready(&mut correlator, &ReadinessPolicy::default()).await;

    assert!(matches!(
        result,
        Err(ReadinessError::Rpc(RpcError::Timeout { .. }))
    ));
    assert_eq!(sink.sent_methods().len(), 1);
}

/// **VALUE**: Verifies a result of the wrong shape is a decode failure.
#[tokio::test]
async fn given_malformed_result_when_awaiting_then_fails_with_decode() {
    let (sink, responses) = ScriptedSink::new(vec![Reply::Result(json!("not an object"))]);
    let mut correlator = Correlator::new(sink, responses, DEFAULT_RPC_TIMEOUT);

    let result = await_ready(&mut correlator, &ReadinessPolicy::default()).await;

    assert!(matches!(result, Err(ReadinessError::Decode { .. })));
}

/// **VALUE**: Verifies the transition table directly, without any I/O.
///
/// **WHY THIS MATTERS**: The retry policy is a visible table; this pins every
/// row so a refactor of the driver cannot silently change it.
#[test]
fn given_transition_table_when_walked_then_matches_policy() {
    let policy = ReadinessPolicy::default();

    let state = ReadinessState::Connecting.next(ReadinessEvent::InfoRequested, &policy);
    assert_eq!(state, ReadinessState::AwaitingInfo { attempt: 1 });

    let state = state.next(
        ReadinessEvent::InfoReceived(report(true, KlippyState::Startup)),
        &policy,
    );
    assert_eq!(state, ReadinessState::StartupRetry { attempt: 1 });

    let state = state.next(ReadinessEvent::RetryDelayElapsed, &policy);
    assert_eq!(state, ReadinessState::AwaitingInfo { attempt: 2 });

    let state = state.next(
        ReadinessEvent::InfoReceived(report(true, KlippyState::Startup)),
        &policy,
    );
    assert_eq!(
        state,
        ReadinessState::Failed(ReadinessFailure::StartupExhausted { attempts: 2 })
    );
    assert!(state.is_terminal());
}

/// **VALUE**: Verifies terminal states ignore further events.
#[test]
fn given_terminal_state_when_event_arrives_then_state_unchanged() {
    let policy = ReadinessPolicy::default();
    let ready = ReadinessState::Ready(report(true, KlippyState::Ready));

    let next = ready.clone().next(
        ReadinessEvent::InfoReceived(report(false, KlippyState::Shutdown)),
        &policy,
    );

    assert_eq!(next, ready);
    assert!(!ReadinessState::Connecting.is_terminal());
}

/// **VALUE**: Verifies the retry budget is driven by the policy.
#[test]
fn given_zero_retries_when_startup_reported_then_fails_immediately() {
    let policy = ReadinessPolicy {
        startup_retry_delay: Duration::from_secs(10),
        max_startup_retries: 0,
    };

    let state = ReadinessState::AwaitingInfo { attempt: 1 }.next(
        ReadinessEvent::InfoReceived(report(true, KlippyState::Startup)),
        &policy,
    );

    assert_eq!(
        state,
        ReadinessState::Failed(ReadinessFailure::StartupExhausted { attempts: 1 })
    );
}
