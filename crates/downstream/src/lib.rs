//! hookrelay downstream adapter.
//!
//! Implements the [`bridge::Downstream`] trait for a Microsoft Teams style
//! incoming-webhook endpoint using `reqwest`.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** HTTP transport, TLS posture, timeouts, and response
//! reading all live here. The [`bridge`] crate sees only
//! [`bridge::Downstream`], [`bridge::DownstreamReply`] and
//! [`bridge::TransportError`].
//!
//! ## Behaviour
//!
//! - Exactly one POST per delivery; no retries, no redirects.
//! - Every status code is returned as a reply. Only failures to obtain a
//!   response at all (connect, TLS, timeout) become a [`bridge::TransportError`].
//! - The delivery URL carries webhook credentials and is never logged.

use std::time::Duration;

use async_trait::async_trait;
use bridge::{Delivery, Downstream, DownstreamReply, TransportError, REQUEST_ID_HEADER};
use reqwest::header::CONTENT_TYPE;
use thiserror::Error;
use tracing::{debug, warn};

/// Configuration for [`HttpDownstream`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Upper bound for the whole request, body included.
    pub timeout: Duration,
    /// `User-Agent` header value.
    pub user_agent: String,
    /// Whether to verify the downstream TLS certificate.
    ///
    /// Only disable for self-signed test environments.
    pub verify_tls: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            user_agent: concat!("hookrelay/", env!("CARGO_PKG_VERSION")).to_string(),
            verify_tls: true,
        }
    }
}

/// Failure to construct the HTTP client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to build HTTP client: {message}")]
    Build { message: String },
}

/// `reqwest`-backed [`Downstream`] implementation.
#[derive(Debug, Clone)]
pub struct HttpDownstream {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpDownstream {
    /// Builds a client from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Build`] if the TLS backend cannot be initialised.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        if !config.verify_tls {
            warn!(
                "TLS certificate verification is DISABLED for downstream calls; \
                 use only against self-signed test endpoints"
            );
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::none())
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()
            .map_err(|e| ClientError::Build {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            timeout: config.timeout,
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> TransportError {
        let (timed_out, connect) = (err.is_timeout(), err.is_connect());
        // reqwest includes the URL (and so the credentials) in its Display output.
        let message = err.without_url().to_string();
        if timed_out {
            TransportError::Timeout {
                timeout_seconds: self.timeout.as_secs(),
            }
        } else if connect {
            TransportError::Connect { message }
        } else {
            TransportError::Other { message }
        }
    }
}

#[async_trait]
impl Downstream for HttpDownstream {
    async fn deliver(&self, delivery: Delivery) -> Result<DownstreamReply, TransportError> {
        debug!(request_id = %delivery.request_id, bytes = delivery.body.len(), "Posting notification");

        let response = self
            .client
            .post(&delivery.url)
            .header(CONTENT_TYPE, "application/json")
            .header(REQUEST_ID_HEADER, delivery.request_id.as_str())
            .body(delivery.body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?
            .to_vec();

        debug!(status, bytes = body.len(), "Downstream answered");

        Ok(DownstreamReply {
            status,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
