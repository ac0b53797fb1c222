use crate::session::fake_moonraker::{FakeMoonraker, Script, TEST_TOKEN, status_update};

use moonraker_core::config::ServerConfig;
use moonraker_core::error::CoreError;
use moonraker_core::error::readiness::ReadinessError;
use moonraker_core::readiness::ReadinessPolicy;
use moonraker_core::session::{MoonrakerSession, SessionOptions};

use std::time::{Duration, Instant};

use serde_json::json;

// ============================================================================
// MoonrakerSession end to end against the in-process fake
// ============================================================================

fn fast_options() -> SessionOptions {
    SessionOptions {
        readiness: ReadinessPolicy {
            startup_retry_delay: Duration::from_millis(50),
            max_startup_retries: 1,
        },
        ..SessionOptions::default()
    }
}

/// **VALUE**: Verifies the whole startup sequence and the status feed.
///
/// **WHY THIS MATTERS**: This is the monitor's only path to data: probe,
/// token, upgrade, handshake, subscribe, then notifications merged while
/// unrelated frames are interleaved.
///
/// **BUG THIS CATCHES**: Would catch a wrong request order, a token missing
/// from the upgrade URL, notifications routed to the correlator, or a close
/// without the normal-closure code.
#[tokio::test]
async fn given_ready_printer_when_session_started_then_subscribes_and_merges_status() {
    // GIVEN: A ready printer that pushes two status updates after subscribe
    let fake = FakeMoonraker::start(Script {
        klippy_states: vec!["ready"],
        notifications: vec![
            status_update(
                json!({
                    "print_stats": {
                        "filename": "benchy.gcode",
                        "state": "printing",
                        "print_duration": 125.0,
                        "info": {"total_layer": 120, "current_layer": 16}
                    },
                    "virtual_sdcard": {"progress": 0.1}
                }),
                10.0,
            ),
            status_update(json!({"print_stats": {"info": {"current_layer": 17}}}), 11.0),
        ],
        ..Script::ready()
    })
    .await;

    // WHEN: Starting a session
    let session = MoonrakerSession::start(&ServerConfig::new(&fake.authority), fast_options())
        .await
        .expect("session should start");

    // THEN: Status converges to the merged notifications
    let mut status = session.status();
    let snapshot = tokio::time::timeout(
        Duration::from_secs(2),
        status.wait_for(|snapshot| snapshot.layer == 17),
    )
    .await
    .expect("status never reached layer 17")
    .expect("status channel closed")
    .clone();

    assert_eq!(snapshot.total_layers, 120);
    assert_eq!(snapshot.filename, "benchy.gcode");
    assert_eq!(snapshot.state, "printing");
    assert_eq!(snapshot.progress, 0.1);
    assert_eq!(snapshot.time_remaining.to_string(), "0:02:05");

    // THEN: Requests went out in order with ids 1 and 2
    assert_eq!(fake.methods(), vec!["server.info", "printer.objects.subscribe"]);
    let ids: Vec<u64> = fake
        .frames()
        .iter()
        .map(|frame| frame["id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(fake.http_paths(), vec!["/", "/access/oneshot_token"]);
    assert!(
        fake.upgrade_line()
            .unwrap()
            .contains(&format!("token={TEST_TOKEN}"))
    );

    // WHEN: Shutting down
    session.shutdown().await;

    // THEN: The peer saw a normal closure
    assert_eq!(fake.close_code().await, Some(1000));
}

/// **VALUE**: Verifies a printer in startup is polled again and then accepted.
#[tokio::test]
async fn given_startup_then_ready_when_session_started_then_retries_once() {
    let fake = FakeMoonraker::start(Script {
        klippy_states: vec!["startup", "ready"],
        notifications: Vec::new(),
        ..Script::ready()
    })
    .await;

    let session = MoonrakerSession::start(&ServerConfig::new(&fake.authority), fast_options())
        .await
        .expect("session should start after one retry");

    assert_eq!(
        fake.methods(),
        vec!["server.info", "server.info", "printer.objects.subscribe"]
    );
    assert!(!session.is_closed());

    session.shutdown().await;
}

/// **VALUE**: Verifies a printer stuck in startup fails the session and closes the socket.
///
/// **BUG THIS CATCHES**: Would catch a failed startup that leaks an open
/// socket, or one that subscribes anyway.
#[tokio::test]
async fn given_startup_twice_when_session_started_then_fails_and_closes() {
    // GIVEN: Klippy never leaves startup
    let fake = FakeMoonraker::start(Script {
        klippy_states: vec!["startup", "startup", "startup"],
        notifications: Vec::new(),
        ..Script::ready()
    })
    .await;

    // WHEN: Starting
    let result =
        MoonrakerSession::start(&ServerConfig::new(&fake.authority), fast_options()).await;

    // THEN: StartupExhausted, no subscribe, normal close
    assert!(matches!(
        result,
        Err(CoreError::Readiness(ReadinessError::StartupExhausted {
            attempts: 2,
            ..
        }))
    ));
    assert_eq!(fake.methods(), vec!["server.info", "server.info"]);
    assert_eq!(fake.close_code().await, Some(1000));
}

/// **VALUE**: Verifies an unreachable backend fails before any socket is opened.
#[tokio::test]
async fn given_no_backend_when_session_started_then_http_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let authority = listener.local_addr().unwrap().to_string();
    drop(listener);

    let result = MoonrakerSession::start(&ServerConfig::new(authority), fast_options()).await;

    assert!(matches!(result, Err(CoreError::HttpClient(_))));
}

/// **VALUE**: Verifies shutdown gives up after the close grace when the peer
/// never acknowledges the close frame.
///
/// **WHY THIS MATTERS**: Ctrl-C must end the monitor promptly even when
/// Moonraker or the network hangs. The close handshake is waited on for at
/// most one second.
///
/// **BUG THIS CATCHES**: Would catch the grace timeout being removed (hang
/// forever) or `close_grace` being ignored (instant teardown or a longer wait).
#[tokio::test]
async fn given_peer_ignoring_close_when_shutting_down_then_returns_after_grace() {
    // GIVEN: A subscribed session whose peer stops reading after subscribe
    let fake = FakeMoonraker::start(Script {
        stall_after_subscribe: true,
        ..Script::ready()
    })
    .await;
    let session = MoonrakerSession::start(
        &ServerConfig::new(&fake.authority),
        SessionOptions::default(),
    )
    .await
    .expect("session should start");
    assert!(!session.is_closed());

    // WHEN: Shutting down
    let started = Instant::now();
    session.shutdown().await;
    let elapsed = started.elapsed();

    // THEN: Torn down after roughly the 1 s grace, not before and not much later
    assert!(
        elapsed >= Duration::from_millis(900) && elapsed <= Duration::from_millis(1500),
        "shutdown took {:?}",
        elapsed
    );
}

/// **VALUE**: Verifies stray responses after startup cannot stall status updates.
///
/// **WHY THIS MATTERS**: Once subscribed, nothing reads responses anymore. If
/// the response queue stayed open, a handful of id-bearing frames would block
/// the receive loop and the snapshot would silently freeze.
///
/// **BUG THIS CATCHES**: Would catch the session keeping its response queue
/// open with no reader after the subscription.
#[tokio::test]
async fn given_many_stray_responses_when_subscribed_then_status_still_merged() {
    // GIVEN: A peer that sends 40 unsolicited responses before a status update
    let fake = FakeMoonraker::start(Script {
        notifications: vec![status_update(
            json!({"print_stats": {"state": "printing"}}),
            5.0,
        )],
        stray_responses: 40,
        ..Script::ready()
    })
    .await;

    // WHEN: Starting and watching status
    let session = MoonrakerSession::start(&ServerConfig::new(&fake.authority), fast_options())
        .await
        .expect("session should start");
    let mut status = session.status();
    let merged = tokio::time::timeout(
        Duration::from_secs(2),
        status.wait_for(|snapshot| snapshot.state == "printing"),
    )
    .await;

    // THEN: The update made it through
    assert!(matches!(merged, Ok(Ok(_))), "status update never merged");
    drop(merged);

    session.shutdown().await;
    assert_eq!(fake.close_code().await, Some(1000));
}
