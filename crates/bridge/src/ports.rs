//! Port trait for the outbound incoming-webhook call.
//!
//! The domain decides *what* to send and how to interpret the answer; the
//! `downstream` crate supplies *how* (HTTP client, TLS, timeouts). Tests
//! substitute an in-memory implementation.

use async_trait::async_trait;
use thiserror::Error;

use crate::identifiers::RequestId;

/// One outbound POST to the downstream incoming-webhook endpoint.
///
/// `url` embeds the path credentials; implementations must not log it.
#[derive(Clone)]
pub struct Delivery {
    /// Full target URL, credentials included.
    pub url: String,
    /// JSON request body.
    pub body: Vec<u8>,
    /// Correlation id, forwarded as `X-Request-Id`.
    pub request_id: RequestId,
}

impl std::fmt::Debug for Delivery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Delivery")
            .field("url", &"<redacted>")
            .field("body_len", &self.body.len())
            .field("request_id", &self.request_id)
            .finish()
    }
}

/// Whatever the downstream service answered, including error statuses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownstreamReply {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// The downstream call did not produce an HTTP answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// No answer within the configured timeout.
    #[error("request timed out after {timeout_seconds}s")]
    Timeout { timeout_seconds: u64 },

    /// Connection refused, DNS failure, or TLS handshake failure.
    #[error("connection failed: {message}")]
    Connect { message: String },

    /// Any other transport-level failure (e.g. the response body was cut off).
    #[error("transport error: {message}")]
    Other { message: String },
}

/// Sends a [`Delivery`] to the downstream service.
///
/// Implementations perform exactly one attempt; the relay never retries.
#[async_trait]
pub trait Downstream: Send + Sync {
    /// POSTs the delivery and returns the downstream answer.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] only when no HTTP response was obtained.
    /// Error statuses (4xx/5xx) are returned as a [`DownstreamReply`].
    async fn deliver(&self, delivery: Delivery) -> Result<DownstreamReply, TransportError>;
}
