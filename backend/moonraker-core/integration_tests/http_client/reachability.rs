use moonraker_core::error::http_client::HttpClientError;
use moonraker_core::http_client::MoonrakerHttpClient;

use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// **VALUE**: Verifies a 200 on `/` passes the probe.
#[tokio::test]
async fn given_ok_root_when_probing_then_reachable() {
    // GIVEN: Backend answering 200 on root
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let client =
        MoonrakerHttpClient::new(&server.address().to_string(), Duration::from_secs(2)).unwrap();

    // WHEN: Probing
    let status = client.check_reachable().await.unwrap();

    // THEN: 200 is reported
    assert_eq!(status.0, 200);
}

/// **VALUE**: Verifies any code other than 200 fails the probe.
///
/// **WHY THIS MATTERS**: A reverse proxy answers 502/503 while Moonraker is
/// still booting. Continuing would only fail at the token step with a less
/// useful message.
#[tokio::test]
async fn given_non_ok_root_when_probing_then_unreachable() {
    for code in [204u16, 503] {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(code))
            .mount(&server)
            .await;
        let client =
            MoonrakerHttpClient::new(&server.address().to_string(), Duration::from_secs(2))
                .unwrap();

        match client.check_reachable().await {
            Err(HttpClientError::Unreachable { status, .. }) => assert_eq!(status.0, code),
            other => panic!("Expected Unreachable for {code}, got {:?}", other),
        }
    }
}

/// **VALUE**: Verifies a refused connection is an HTTP error.
#[tokio::test]
async fn given_nothing_listening_when_probing_then_http_error() {
    // GIVEN: A port that was just released
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let authority = listener.local_addr().unwrap().to_string();
    drop(listener);
    let client = MoonrakerHttpClient::new(&authority, Duration::from_secs(2)).unwrap();

    assert!(matches!(
        client.check_reachable().await,
        Err(HttpClientError::Http { .. })
    ));
}
