use std::time::Duration;

use bridge::RequestId;
use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

use super::*;

const WEBHOOK_PATH: &str = "/webhookb2/id1@tenant/IncomingWebhook/id2/id3";

fn delivery_to(url: String) -> Delivery {
    Delivery {
        url,
        body: br#"{"type":"message","attachments":[]}"#.to_vec(),
        request_id: RequestId::new("req-77").unwrap(),
    }
}

fn client_with_timeout(timeout: Duration) -> HttpDownstream {
    HttpDownstream::new(&ClientConfig {
        timeout,
        ..ClientConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn posts_json_with_request_id_header() {
    let mock_server = MockServer::start().await;

    Mock::given(matchers::method("POST"))
        .and(matchers::path(WEBHOOK_PATH))
        .and(matchers::header("content-type", "application/json"))
        .and(matchers::header("x-request-id", "req-77"))
        .and(matchers::body_string(r#"{"type":"message","attachments":[]}"#))
        .respond_with(ResponseTemplate::new(200).set_body_string("1"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HttpDownstream::new(&ClientConfig::default()).unwrap();
    let reply = client
        .deliver(delivery_to(format!("{}{WEBHOOK_PATH}", mock_server.uri())))
        .await
        .unwrap();

    assert_eq!(reply.status, 200);
    assert_eq!(reply.body, b"1");
}

#[tokio::test]
async fn error_status_is_a_reply_not_a_transport_error() {
    let mock_server = MockServer::start().await;

    Mock::given(matchers::method("POST"))
        .respond_with(
            ResponseTemplate::new(503)
                .set_body_string("Service Unavailable")
                .insert_header("content-type", "text/plain"),
        )
        .mount(&mock_server)
        .await;

    let client = HttpDownstream::new(&ClientConfig::default()).unwrap();
    let reply = client
        .deliver(delivery_to(format!("{}{WEBHOOK_PATH}", mock_server.uri())))
        .await
        .unwrap();

    assert_eq!(reply.status, 503);
    assert_eq!(reply.content_type.as_deref(), Some("text/plain"));
    assert_eq!(reply.body, b"Service Unavailable");
}

#[tokio::test]
async fn unreachable_host_is_a_connect_error_without_credentials() {
    // Port 9 (discard) on loopback is closed on test machines.
    let client = client_with_timeout(Duration::from_secs(5));
    let err = client
        .deliver(delivery_to(format!("http://127.0.0.1:9{WEBHOOK_PATH}")))
        .await
        .unwrap_err();

    match err {
        TransportError::Connect { message } => assert!(!message.contains("id1@tenant")),
        other => panic!("expected connect error, got {other:?}"),
    }
}

#[tokio::test]
async fn slow_downstream_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let client = client_with_timeout(Duration::from_millis(200));
    let err = client
        .deliver(delivery_to(format!("{}{WEBHOOK_PATH}", mock_server.uri())))
        .await
        .unwrap_err();

    assert!(matches!(err, TransportError::Timeout { .. }));
}

#[tokio::test]
async fn redirects_are_not_followed() {
    let mock_server = MockServer::start().await;

    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "http://example.invalid/"))
        .mount(&mock_server)
        .await;

    let client = HttpDownstream::new(&ClientConfig::default()).unwrap();
    let reply = client
        .deliver(delivery_to(format!("{}{WEBHOOK_PATH}", mock_server.uri())))
        .await
        .unwrap();

    assert_eq!(reply.status, 302);
}

#[test]
fn insecure_client_can_be_built() {
    let config = ClientConfig {
        verify_tls: false,
        ..ClientConfig::default()
    };
    assert!(HttpDownstream::new(&config).is_ok());
}
