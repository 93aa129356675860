//! Local stand-in for the downstream incoming-webhook service.
//!
//! Answers the same path shape as the real service. A liveness ping gets
//! `ok`; any other body gets `{"RequestID": "<id>"}` so a caller can check
//! that the correlation header made it through the relay.

use std::net::SocketAddr;

use axum::{
    body::Bytes,
    http::header::CONTENT_TYPE,
    middleware,
    response::{IntoResponse, Response},
    routing::{any, get},
    Extension, Json, Router,
};
use bridge::{Payload, RedactionPolicy, RequestId};
use serde::Serialize;
use tracing::debug;

use crate::{
    handlers,
    middleware::{assign_request_id, observe_request},
    server::{serve_single, HEALTH_ROUTE, RELAY_ROUTE},
};

#[derive(Debug, Serialize)]
struct EchoReply {
    #[serde(rename = "RequestID")]
    request_id: String,
}

/// Creates the echo router. Serves the webhook path for any method, plus `/healthz`.
pub fn create_echo_router(policy: RedactionPolicy) -> Router {
    Router::new()
        .route(RELAY_ROUTE, any(echo_webhook))
        .route(HEALTH_ROUTE, get(handlers::healthz))
        .layer(middleware::from_fn_with_state(policy, observe_request))
        .layer(middleware::from_fn(assign_request_id))
}

/// Serves the echo router on `addr` until a shutdown signal arrives.
///
/// # Errors
///
/// Returns `std::io::Error` if `addr` cannot be bound.
pub async fn serve_echo(addr: SocketAddr, policy: RedactionPolicy) -> Result<(), std::io::Error> {
    serve_single(addr, create_echo_router(policy)).await
}

async fn echo_webhook(Extension(request_id): Extension<RequestId>, body: Bytes) -> Response {
    match Payload::classify(&body) {
        Payload::Ping => {
            debug!("Request was a test ping");
            ([(CONTENT_TYPE, "text/plain")], "ok").into_response()
        }
        _ => Json(EchoReply {
            request_id: request_id.as_str().to_string(),
        })
        .into_response(),
    }
}

#[cfg(test)]
#[path = "echo_tests.rs"]
mod tests;
