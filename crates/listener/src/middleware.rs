//! Request-id propagation and redacting access logs.

use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::{header::CONTENT_LENGTH, HeaderValue},
    middleware::Next,
    response::Response,
};
use bridge::{observed_request_path, RedactionPolicy, RequestId, REQUEST_ID_HEADER};
use tracing::{info, info_span, Instrument};

/// Attaches a [`RequestId`] to the request extensions and the response headers.
///
/// An inbound `X-Request-Id` header is reused when present and non-empty;
/// otherwise a fresh id is generated.
pub async fn assign_request_id(mut req: Request, next: Next) -> Response {
    let inbound = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok());
    let request_id = RequestId::from_header_or_random(inbound);

    req.extensions_mut().insert(request_id.clone());

    let mut response = next.run(req).await;

    if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

/// Wraps the request in a span and writes one access-log line per request.
///
/// Must run inside [`assign_request_id`] so the span carries the request id.
pub async fn observe_request(
    State(policy): State<RedactionPolicy>,
    req: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let method = req.method().clone();
    let path = observed_request_path(req.uri().path(), policy);
    let request_id = req
        .extensions()
        .get::<RequestId>()
        .map(|id| id.as_str().to_string())
        .unwrap_or_default();
    let bytes_received = req
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(0);

    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        path = %path,
    );

    let response = next.run(req).instrument(span.clone()).await;

    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    span.in_scope(|| {
        info!(
            status = response.status().as_u16(),
            latency_ms,
            bytes_received,
            "{method} {path}"
        );
    });

    response
}

#[cfg(test)]
#[path = "middleware_tests.rs"]
mod tests;
