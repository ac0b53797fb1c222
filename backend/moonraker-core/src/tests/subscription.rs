// Unit tests for the status subscription request

use crate::correlator::{Correlator, DEFAULT_RPC_TIMEOUT};
use crate::error::rpc::RpcError;
use crate::subscription::subscribe_status;
use crate::tests::support::{Reply, ScriptedSink};

use models::ObjectSubscription;

use serde_json::json;

/// **VALUE**: Verifies the default subscription asks for every field of both objects.
///
/// **WHY THIS MATTERS**: `null` means "all fields" to Moonraker. Listing
/// fields explicitly would silently miss `info.current_layer`.
#[tokio::test]
async fn given_default_objects_when_subscribing_then_params_request_all_fields() {
    // GIVEN: A backend that accepts the subscription
    let (sink, responses) = ScriptedSink::new(vec![Reply::Result(json!({"status": {}}))]);
    let mut correlator = Correlator::new(sink.clone(), responses, DEFAULT_RPC_TIMEOUT);

    // WHEN: Subscribing with defaults
    let result = subscribe_status(&mut correlator, &ObjectSubscription::default()).await;

    // THEN: One subscribe request with both objects set to null
    assert_eq!(result.unwrap(), json!({"status": {}}));
    let sent = sink.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["method"], "printer.objects.subscribe");
    assert_eq!(
        sent[0]["params"],
        json!({"objects": {"print_stats": null, "virtual_sdcard": null}})
    );
}

/// **VALUE**: Verifies extra objects and field lists reach the wire.
#[tokio::test]
async fn given_custom_objects_when_subscribing_then_fields_listed() {
    let (sink, responses) = ScriptedSink::new(vec![Reply::Result(json!({}))]);
    let mut correlator = Correlator::new(sink.clone(), responses, DEFAULT_RPC_TIMEOUT);
    let objects = ObjectSubscription::default()
        .with_object("extruder", Some(vec![String::from("temperature")]));

    subscribe_status(&mut correlator, &objects).await.unwrap();

    assert_eq!(
        sink.sent()[0]["params"]["objects"]["extruder"],
        json!(["temperature"])
    );
}

/// **VALUE**: Verifies a rejected subscription surfaces as an error.
///
/// **BUG THIS CATCHES**: Would catch a subscription that reports success
/// without looking at the response at all.
#[tokio::test(start_paused = true)]
async fn given_silent_backend_when_subscribing_then_times_out() {
    let (sink, responses) = ScriptedSink::new(vec![Reply::Silent]);
    let mut correlator = Correlator::new(sink, responses, DEFAULT_RPC_TIMEOUT);

    let result = subscribe_status(&mut correlator, &ObjectSubscription::default()).await;

    assert!(matches!(result, Err(RpcError::Timeout { .. })));
}
