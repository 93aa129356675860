//! Route handlers for the relay and liveness surfaces.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    Extension,
};
use bridge::{CredentialPath, Relay, RelayRequest, RelayResponse, RequestId};

/// `POST /webhookb2/{id1}/IncomingWebhook/{id2}/{id3}`
///
/// Path segments arrive percent-decoded. The relay answers every request, so
/// this handler only converts between HTTP and [`RelayRequest`] / [`RelayResponse`].
pub async fn relay_webhook(
    State(relay): State<Arc<Relay>>,
    Path((id1, id2, id3)): Path<(String, String, String)>,
    Extension(request_id): Extension<RequestId>,
    body: Bytes,
) -> Response {
    let request = RelayRequest {
        path: CredentialPath::new(id1, id2, id3),
        body: body.to_vec(),
        request_id,
    };

    into_http(relay.handle(request).await)
}

/// `GET /healthz`: liveness only, no dependency checks.
pub async fn healthz() -> StatusCode {
    StatusCode::NO_CONTENT
}

fn into_http(response: RelayResponse) -> Response {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::BAD_GATEWAY);
    (status, [(CONTENT_TYPE, response.content_type)], response.body).into_response()
}
