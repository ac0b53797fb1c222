use moonraker_core::error::http_client::HttpClientError;
use moonraker_core::http_client::{DEFAULT_HTTP_TIMEOUT, MoonrakerHttpClient};

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// fetch_oneshot_token() against a mocked Moonraker HTTP API
// ============================================================================

async fn client_for(server: &MockServer) -> MoonrakerHttpClient {
    MoonrakerHttpClient::new(&server.address().to_string(), DEFAULT_HTTP_TIMEOUT)
        .expect("Failed to build HTTP client")
}

/// **VALUE**: Verifies the token is taken from the `result` field.
///
/// **WHY THIS MATTERS**: The token is the only credential for the socket
/// upgrade; reading the wrong field means every connect is rejected.
#[tokio::test]
async fn given_token_response_when_fetching_then_returns_token() {
    // GIVEN: Moonraker issuing a token
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/access/oneshot_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": "Z1X2C3V4"})))
        .expect(1)
        .mount(&server)
        .await;
    let client = client_for(&server).await;

    // WHEN: Fetching
    let token = client.fetch_oneshot_token().await.expect("token fetch failed");

    // THEN: Token is the result string, and never printed
    assert_eq!(token.expose(), "Z1X2C3V4");
    assert!(!format!("{:?}", token).contains("Z1X2C3V4"));
}

/// **VALUE**: Verifies a non-string result is used in its JSON text form.
#[tokio::test]
async fn given_numeric_result_when_fetching_then_stringified() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/access/oneshot_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": 12345})))
        .mount(&server)
        .await;
    let client = client_for(&server).await;

    let token = client.fetch_oneshot_token().await.unwrap();

    assert_eq!(token.expose(), "12345");
}

/// **VALUE**: Verifies a missing or null result is reported as a missing token.
///
/// **BUG THIS CATCHES**: Would catch a client that connects with the literal
/// token `null` and fails later with a confusing upgrade error.
#[tokio::test]
async fn given_missing_or_null_result_when_fetching_then_token_missing() {
    for body in [json!({}), json!({"result": null})] {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/access/oneshot_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
            .mount(&server)
            .await;
        let client = client_for(&server).await;

        let result = client.fetch_oneshot_token().await;

        assert!(
            matches!(result, Err(HttpClientError::TokenMissing { .. })),
            "body {body} gave {:?}",
            result
        );
    }
}

/// **VALUE**: Verifies an error status surfaces with its code.
#[tokio::test]
async fn given_server_error_when_fetching_then_server_error_with_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/access/oneshot_token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .mount(&server)
        .await;
    let client = client_for(&server).await;

    match client.fetch_oneshot_token().await {
        Err(HttpClientError::Server {
            status, message, ..
        }) => {
            assert_eq!(status.0, 401);
            assert_eq!(message, "Unauthorized");
        }
        other => panic!("Expected Server error, got {:?}", other),
    }
}

/// **VALUE**: Verifies a non-JSON body is a JSON error rather than a panic.
#[tokio::test]
async fn given_non_json_body_when_fetching_then_json_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/access/oneshot_token"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;
    let client = client_for(&server).await;

    assert!(matches!(
        client.fetch_oneshot_token().await,
        Err(HttpClientError::Json { .. })
    ));
}
