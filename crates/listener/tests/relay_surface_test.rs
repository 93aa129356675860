//! End-to-end tests for the relay surface.
//!
//! Drives the relay router with the real `reqwest` downstream adapter against a
//! mock incoming-webhook service, and against the echo backend on a local port.

use std::{sync::Arc, time::Duration};

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use bridge::{DownstreamEndpoint, RedactionPolicy, Relay, RelaySettings};
use downstream::{ClientConfig, HttpDownstream};
use listener::{create_echo_router, create_relay_router};
use serde_json::json;
use tower::ServiceExt;
use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

const WEBHOOK_PATH: &str = "/webhookb2/id1@tenant/IncomingWebhook/id2/id3";

fn relay_app(host: &str) -> Router {
    let settings = RelaySettings {
        endpoint: DownstreamEndpoint::new("http", host),
        redaction: RedactionPolicy::Fingerprint,
    };
    let client = HttpDownstream::new(&ClientConfig {
        timeout: Duration::from_secs(2),
        ..ClientConfig::default()
    })
    .expect("client build");
    create_relay_router(
        Arc::new(Relay::new(settings, Arc::new(client))),
        Duration::from_secs(5),
    )
}

fn event_request(request_id: &str) -> Request<Body> {
    let body = json!({
        "eventKey": "pr:opened",
        "pullRequest": {
            "title": "Add relay",
            "author": { "user": { "name": "jdoe", "emailAddress": "jdoe@example.com", "displayName": "Jane Doe" } },
            "reviewers": [
                { "user": { "name": "asmith", "emailAddress": "asmith@example.com", "displayName": "Alex Smith" } }
            ],
            "links": { "self": [{ "href": "https://git.example.com/pr/1" }] }
        }
    });
    Request::builder()
        .method("POST")
        .uri(WEBHOOK_PATH)
        .header("x-request-id", request_id)
        .body(Body::from(body.to_string()))
        .expect("request build")
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body extraction");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

/// A successful downstream answer is passed through unchanged.
#[tokio::test]
async fn notification_is_delivered_and_reply_mirrored() {
    let mock_server = MockServer::start().await;

    Mock::given(matchers::method("POST"))
        .and(matchers::path(WEBHOOK_PATH))
        .and(matchers::header("x-request-id", "e2e-1"))
        .and(matchers::header("content-type", "application/json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("1")
                .insert_header("content-type", "text/plain; charset=utf-8"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = relay_app(&mock_server.address().to_string());
    let response = app.oneshot(event_request("e2e-1")).await.expect("request execution");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-request-id"], "e2e-1");
    assert_eq!(response.headers()["content-type"], "text/plain; charset=utf-8");
    assert_eq!(body_text(response).await, "1");

    let received = mock_server.received_requests().await.expect("recording enabled");
    let sent: serde_json::Value = serde_json::from_slice(&received[0].body).expect("json body");
    let text = sent["attachments"][0]["content"]["body"][0]["text"]
        .as_str()
        .expect("text block");
    assert!(text.starts_with("Hi Team, <at>jdoe UPN</at> opened a PR, please review: "));
    assert!(text.ends_with("CC: <at>asmith UPN</at>"));
}

/// Downstream error statuses keep their code but not their body.
#[tokio::test]
async fn downstream_error_status_is_mirrored() {
    let mock_server = MockServer::start().await;

    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("tenant throttled"))
        .mount(&mock_server)
        .await;

    let app = relay_app(&mock_server.address().to_string());
    let response = app.oneshot(event_request("e2e-2")).await.expect("request execution");

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let text = body_text(response).await;
    assert!(text.contains("e2e-2"));
    assert!(!text.contains("tenant throttled"));
}

/// No response at all from downstream is a gateway failure.
#[tokio::test]
async fn unreachable_downstream_is_gateway_timeout() {
    let app = relay_app("127.0.0.1:9");
    let response = app.oneshot(event_request("e2e-3")).await.expect("request execution");

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    let text = body_text(response).await;
    assert!(text.contains("e2e-3"));
    assert!(!text.contains("id1@tenant"));
}

/// The echo backend sees the forwarded request id.
#[tokio::test]
async fn echo_backend_receives_forwarded_request_id() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind echo backend");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, create_echo_router(RedactionPolicy::Fingerprint))
            .await
            .expect("echo backend");
    });

    let app = relay_app(&addr.to_string());
    let response = app.oneshot(event_request("e2e-4")).await.expect("request execution");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "application/json");
    let reply: serde_json::Value =
        serde_json::from_str(&body_text(response).await).expect("json reply");
    assert_eq!(reply, json!({ "RequestID": "e2e-4" }));
}
