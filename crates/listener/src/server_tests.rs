use std::sync::Mutex;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use bridge::{
    fingerprint, Delivery, Downstream, DownstreamEndpoint, DownstreamReply, RelaySettings,
    TransportError,
};
use serde_json::json;
use tower::ServiceExt;

use super::*;
use crate::test_logs::CapturedLogs;

const WEBHOOK_PATH: &str = "/webhookb2/id1%40tenant/IncomingWebhook/id2/id3";

/// Records deliveries and answers `200 "1"`, optionally after a delay.
#[derive(Default)]
struct RecordingDownstream {
    delay: Option<Duration>,
    deliveries: Mutex<Vec<Delivery>>,
}

impl RecordingDownstream {
    fn calls(&self) -> usize {
        self.deliveries.lock().unwrap().len()
    }

    fn last(&self) -> Delivery {
        self.deliveries.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl Downstream for RecordingDownstream {
    async fn deliver(&self, delivery: Delivery) -> Result<DownstreamReply, TransportError> {
        self.deliveries.lock().unwrap().push(delivery);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(DownstreamReply {
            status: 200,
            content_type: Some("text/plain; charset=utf-8".to_string()),
            body: b"1".to_vec(),
        })
    }
}

fn relay_app(downstream: Arc<RecordingDownstream>, timeout: Duration) -> Router {
    let settings = RelaySettings {
        endpoint: DownstreamEndpoint::new("https", "teams.example.com"),
        redaction: RedactionPolicy::Fingerprint,
    };
    create_relay_router(Arc::new(Relay::new(settings, downstream)), timeout)
}

fn post(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(WEBHOOK_PATH)
        .header("x-request-id", "req-9")
        .body(body.into())
        .expect("request build")
}

fn event_body() -> String {
    json!({
        "eventKey": "pr:from_ref_updated",
        "pullRequest": {
            "title": "Bump deps",
            "author": { "user": { "name": "jdoe", "emailAddress": "jdoe@example.com", "displayName": "Jane Doe" } },
            "links": { "self": [{ "href": "https://git.example.com/pr/7" }] }
        }
    })
    .to_string()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body extraction");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

#[tokio::test]
async fn healthz_answers_no_content_on_both_routers() {
    let downstream = Arc::new(RecordingDownstream::default());
    let routers = [
        relay_app(downstream.clone(), Duration::from_secs(5)),
        create_health_router(RedactionPolicy::Fingerprint),
    ];

    for router in routers {
        let request = Request::builder()
            .uri("/healthz")
            .body(Body::empty())
            .expect("request build");
        let response = router.oneshot(request).await.expect("request execution");

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.headers().contains_key("x-request-id"));
    }
    assert_eq!(downstream.calls(), 0);
}

#[tokio::test]
async fn ping_is_answered_locally() {
    let downstream = Arc::new(RecordingDownstream::default());
    let app = relay_app(downstream.clone(), Duration::from_secs(5));

    let response = app
        .oneshot(post(r#"{"test": true}"#))
        .await
        .expect("request execution");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-request-id"], "req-9");
    assert_eq!(body_text(response).await, "ok");
    assert_eq!(downstream.calls(), 0);
}

#[tokio::test]
async fn empty_body_is_bad_request() {
    let downstream = Arc::new(RecordingDownstream::default());
    let app = relay_app(downstream.clone(), Duration::from_secs(5));

    let response = app.oneshot(post(Body::empty())).await.expect("request execution");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "Error: Request Body is empty");
    assert_eq!(downstream.calls(), 0);
}

#[tokio::test]
async fn event_is_forwarded_with_decoded_credentials_and_request_id() {
    let downstream = Arc::new(RecordingDownstream::default());
    let app = relay_app(downstream.clone(), Duration::from_secs(5));

    let response = app.oneshot(post(event_body())).await.expect("request execution");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "text/plain; charset=utf-8");
    assert_eq!(body_text(response).await, "1");

    let delivery = downstream.last();
    assert_eq!(
        delivery.url,
        "https://teams.example.com/webhookb2/id1@tenant/IncomingWebhook/id2/id3"
    );
    assert_eq!(delivery.request_id.as_str(), "req-9");
}

#[tokio::test]
async fn other_methods_are_not_relayed() {
    let downstream = Arc::new(RecordingDownstream::default());
    let app = relay_app(downstream.clone(), Duration::from_secs(5));

    let request = Request::builder()
        .method("GET")
        .uri(WEBHOOK_PATH)
        .body(Body::empty())
        .expect("request build");
    let response = app.oneshot(request).await.expect("request execution");

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(downstream.calls(), 0);
}

#[tokio::test]
async fn slow_request_hits_the_request_timeout() {
    let downstream = Arc::new(RecordingDownstream {
        delay: Some(Duration::from_secs(2)),
        ..RecordingDownstream::default()
    });
    let app = relay_app(downstream, Duration::from_millis(50));

    let response = app.oneshot(post(event_body())).await.expect("request execution");

    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    assert_eq!(response.headers()["x-request-id"], "req-9");
}

async fn logs_for_exit(body: impl Into<Body>) -> (StatusCode, String, usize) {
    let downstream = Arc::new(RecordingDownstream::default());
    let app = relay_app(downstream.clone(), Duration::from_secs(5));
    let (logs, _guard) = CapturedLogs::install(tracing::Level::DEBUG);

    let request = Request::builder()
        .method("POST")
        .uri("/webhookb2/secret-one/IncomingWebhook/secret-two/secret-three")
        .body(body.into())
        .expect("request build");
    let response = app.oneshot(request).await.expect("request execution");

    (response.status(), logs.contents(), downstream.calls())
}

fn assert_redacted(output: &str) {
    let expected = format!(
        "/webhookb2/{}/IncomingWebhook/{}/{}",
        fingerprint("secret-one"),
        fingerprint("secret-two"),
        fingerprint("secret-three")
    );
    assert!(output.contains(&expected), "log output: {output}");
    assert!(!output.contains("secret-"), "log output: {output}");
}

#[tokio::test]
async fn empty_body_exit_logs_only_fingerprints() {
    let (status, output, calls) = logs_for_exit("").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(calls, 0);
    assert!(output.contains("Rejected relay request"), "log output: {output}");
    assert_redacted(&output);
}

#[tokio::test]
async fn malformed_body_exit_logs_only_fingerprints() {
    let (status, output, calls) = logs_for_exit(r#"{"eventKey": "#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(calls, 0);
    assert!(output.contains("Failed to translate request body"), "log output: {output}");
    assert!(output.contains("Answering with error response"), "log output: {output}");
    assert!(
        output.contains("Request Body is not a valid pull request event"),
        "log output: {output}"
    );
    assert_redacted(&output);
}

#[tokio::test]
async fn ping_exit_logs_only_fingerprints() {
    let (status, output, calls) = logs_for_exit(r#"{"test": true}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(calls, 0);
    assert!(output.contains("Request was a test ping"), "log output: {output}");
    assert_redacted(&output);
}

#[tokio::test]
async fn forwarded_event_logs_composed_notification() {
    let (status, output, calls) = logs_for_exit(event_body()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(calls, 1);
    assert!(output.contains("Composed pull request notification"), "log output: {output}");
    assert!(output.contains("mentions=1"), "log output: {output}");
    assert!(output.contains("updated source branch in PR"), "log output: {output}");
    assert_redacted(&output);
}
