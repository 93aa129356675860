//! The relay request lifecycle.
//!
//! [`Relay::handle`] takes the credential path, body and correlation id of one
//! inbound request and always produces a [`RelayResponse`]. Empty bodies, pings
//! and untranslatable bodies are answered locally without touching the
//! downstream service; everything else is translated and forwarded once.
//!
//! | Outcome | Status | Body |
//! |---------|--------|------|
//! | empty body | 400 | fixed message |
//! | ping | 200 | `ok` |
//! | translation failure | 400 | generic message |
//! | downstream >= 400 | mirrored | message with request id |
//! | transport failure | 504 | message with request id |
//! | downstream < 400 | mirrored | downstream body |

use std::sync::Arc;

use tracing::{debug, error, info, instrument, trace, warn};

use crate::errors::RelayError;
use crate::identifiers::RequestId;
use crate::payload::Payload;
use crate::ports::{Delivery, Downstream, DownstreamReply};
use crate::redaction::{CredentialPath, RedactionPolicy};
use crate::translate::translate;

const CONTENT_TYPE_JSON: &str = "application/json";
const CONTENT_TYPE_TEXT: &str = "text/plain; charset=utf-8";
const PING_REPLY: &str = "ok";

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Where the downstream incoming-webhook service lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownstreamEndpoint {
    /// `https` in production, `http` for local development.
    pub scheme: String,
    /// Host name, optionally with `:port`.
    pub host: String,
}

impl DownstreamEndpoint {
    /// Creates an endpoint description.
    pub fn new(scheme: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
        }
    }

    /// Full downstream URL for `path`, credentials included.
    pub fn url_for(&self, path: &CredentialPath) -> String {
        format!("{}://{}{}", self.scheme, self.host, path.expose())
    }
}

/// Immutable relay configuration, built once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelaySettings {
    pub endpoint: DownstreamEndpoint,
    pub redaction: RedactionPolicy,
}

// ---------------------------------------------------------------------------
// Request / response
// ---------------------------------------------------------------------------

/// One inbound relay request.
#[derive(Debug, Clone)]
pub struct RelayRequest {
    pub path: CredentialPath,
    pub body: Vec<u8>,
    pub request_id: RequestId,
}

/// What to answer the original caller with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayResponse {
    pub status: u16,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl RelayResponse {
    fn text(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            content_type: CONTENT_TYPE_TEXT.to_string(),
            body: message.into().into_bytes(),
        }
    }

    fn from_reply(reply: DownstreamReply) -> Self {
        Self {
            status: reply.status,
            content_type: reply
                .content_type
                .unwrap_or_else(|| CONTENT_TYPE_JSON.to_string()),
            body: reply.body,
        }
    }

    fn from_error(err: &RelayError) -> Self {
        Self::text(err.status(), err.public_message())
    }

    /// Body as UTF-8 text (lossy).
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Translates and forwards pull-request events to the downstream service.
///
/// Holds no per-request state; one instance is shared by all request tasks.
#[derive(Clone)]
pub struct Relay {
    settings: RelaySettings,
    downstream: Arc<dyn Downstream>,
}

impl std::fmt::Debug for Relay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Relay")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Relay {
    /// Creates a relay forwarding through `downstream`.
    pub fn new(settings: RelaySettings, downstream: Arc<dyn Downstream>) -> Self {
        Self {
            settings,
            downstream,
        }
    }

    /// The settings this relay was built with.
    pub fn settings(&self) -> &RelaySettings {
        &self.settings
    }

    /// Handles one inbound request end to end.
    ///
    /// Never fails: every error is logged with full detail and converted into
    /// a response carrying only a generic message.
    #[instrument(name = "relay", skip_all, fields(request_id = %request.request_id))]
    pub async fn handle(&self, request: RelayRequest) -> RelayResponse {
        if self.settings.redaction == RedactionPolicy::Reveal {
            debug!(
                path = %request.path.expose(),
                body = %String::from_utf8_lossy(&request.body),
                "Relay request received"
            );
        }

        match self.forward(&request).await {
            Ok(response) => response,
            Err(err) => {
                match &err {
                    RelayError::EmptyBody => debug!(error = %err, "Rejected relay request"),
                    RelayError::DownstreamStatus { .. } | RelayError::DownstreamTransport { .. } => {
                        error!(error = %err, status = err.status(), "Downstream request failed")
                    }
                    RelayError::Translation(_) => {
                        error!(error = %err, status = err.status(), "Failed to translate request body")
                    }
                }
                let response = RelayResponse::from_error(&err);
                debug!(
                    status = response.status,
                    body = %response.body_text(),
                    "Answering with error response"
                );
                response
            }
        }
    }

    async fn forward(&self, request: &RelayRequest) -> Result<RelayResponse, RelayError> {
        let notification = match Payload::classify(&request.body) {
            Payload::Empty => return Err(RelayError::EmptyBody),
            Payload::Ping => {
                debug!("Request was a test ping");
                return Ok(RelayResponse::text(200, PING_REPLY));
            }
            Payload::Event(event) => translate(event)?,
        };
        trace!(notification = %String::from_utf8_lossy(&notification), "Notification body");

        let delivery = Delivery {
            url: self.settings.endpoint.url_for(&request.path),
            body: notification,
            request_id: request.request_id.clone(),
        };

        let reply = self
            .downstream
            .deliver(delivery)
            .await
            .map_err(|source| RelayError::DownstreamTransport {
                request_id: request.request_id.clone(),
                source,
            })?;

        info!(status = reply.status, "Notification sent downstream");

        if reply.status >= 400 {
            warn!(
                status = reply.status,
                body = %String::from_utf8_lossy(&reply.body),
                "Downstream rejected notification"
            );
            return Err(RelayError::DownstreamStatus {
                request_id: request.request_id.clone(),
                status: reply.status,
            });
        }

        debug!(
            content_type = reply.content_type.as_deref().unwrap_or("none"),
            body = %String::from_utf8_lossy(&reply.body),
            "Downstream response"
        );
        Ok(RelayResponse::from_reply(reply))
    }
}

#[cfg(test)]
#[path = "relay_tests.rs"]
mod tests;
