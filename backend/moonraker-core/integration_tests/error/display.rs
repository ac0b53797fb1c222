use moonraker_core::error::CoreError;
use moonraker_core::error::readiness::ReadinessError;
use moonraker_core::error::rpc::RpcError;

use common::ErrorLocation;

use std::panic::Location;
use std::time::Duration;

/// **VALUE**: Verifies RPC errors name the method, the id and where they came from.
///
/// **WHY THIS MATTERS**: A startup failure is usually a single log line.
/// Without method and location that line cannot be traced back.
///
/// **BUG THIS CATCHES**: Would catch if the `location` field is dropped from
/// the Display format.
#[test]
#[track_caller]
fn given_timeout_error_when_formatted_then_includes_method_and_location() {
    // GIVEN: A timeout error
    let err = RpcError::Timeout {
        method: String::from("server.info"),
        id: 3,
        waited: Duration::from_secs(5),
        location: ErrorLocation::from(Location::caller()),
    };

    // WHEN: Formatting
    let error_string = format!("{}", err);

    // THEN: Type, method, id and file location
    assert!(error_string.contains("RPC Timeout Error"));
    assert!(error_string.contains("server.info"));
    assert!(error_string.contains("id 3"));
    assert!(error_string.contains("display.rs"));
}

/// **VALUE**: Verifies wrapped errors keep their message through `CoreError`.
#[test]
#[track_caller]
fn given_readiness_error_when_wrapped_then_display_is_transparent() {
    let inner = ReadinessError::NotReady {
        connected: false,
        state: String::from("shutdown"),
        location: ErrorLocation::from(Location::caller()),
    };
    let expected = inner.to_string();

    let err = CoreError::from(inner);

    assert_eq!(err.to_string(), expected);
    assert!(expected.contains("klippy_state=shutdown"));
}

/// **VALUE**: Verifies the `?` conversion records the conversion site.
#[test]
fn given_json_error_when_converted_then_location_points_here() {
    let json_err = serde_json::from_str::<u8>("x").unwrap_err();

    let err = RpcError::from(json_err);

    match err {
        RpcError::Encode { location, .. } => assert!(location.file.ends_with("display.rs")),
        other => panic!("Expected Encode, got {:?}", other),
    }
}
