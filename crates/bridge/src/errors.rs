//! Error types for translation and relaying.
//!
//! [`TranslateError`] covers everything that can go wrong turning a source
//! event into a notification. [`RelayError`] covers the full request lifecycle
//! and knows which HTTP status and which caller-facing message each condition
//! maps to.
//!
//! Variants carry full detail for server-side logs. Only
//! [`RelayError::public_message`] is ever sent back to the caller, and it
//! never includes parse errors, downstream bodies, or credentials.

use thiserror::Error;

use crate::identifiers::RequestId;
use crate::ports::TransportError;

/// HTTP status used when the downstream service could not be reached at all.
pub const GATEWAY_FAILURE_STATUS: u16 = 504;

// ---------------------------------------------------------------------------
// Translation errors
// ---------------------------------------------------------------------------

/// Failure to turn a source event into a notification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateError {
    /// The body is not JSON, or not shaped like a pull-request event.
    #[error("Failed to decode pull request event: {message}")]
    Decode {
        /// Parser diagnostic (server-side logs only).
        message: String,
    },

    /// The event is well-formed but has no `pullRequest.links.self` entry.
    #[error("Pull request event has no self link")]
    MissingLink,

    /// The notification could not be serialised.
    #[error("Failed to encode notification: {message}")]
    Encode {
        /// Serialiser diagnostic.
        message: String,
    },
}

// ---------------------------------------------------------------------------
// Relay errors
// ---------------------------------------------------------------------------

/// Any condition that ends a relay request without a successful forward.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    /// The inbound request had no body.
    #[error("Request Body is empty")]
    EmptyBody,

    /// The body could not be translated; nothing was sent downstream.
    #[error(transparent)]
    Translation(#[from] TranslateError),

    /// The downstream service answered with an error status.
    #[error("Downstream request ({request_id}) failed with HTTP status {status}")]
    DownstreamStatus {
        /// Correlation id of the failed request.
        request_id: RequestId,
        /// Status returned by the downstream service (>= 400).
        status: u16,
    },

    /// The downstream service could not be reached or did not answer in time.
    #[error("Downstream request ({request_id}) reported error: {source}")]
    DownstreamTransport {
        /// Correlation id of the failed request.
        request_id: RequestId,
        /// Transport failure detail.
        #[source]
        source: TransportError,
    },
}

impl RelayError {
    /// HTTP status to answer the original caller with.
    pub fn status(&self) -> u16 {
        match self {
            Self::EmptyBody => 400,
            Self::Translation(TranslateError::Decode { .. } | TranslateError::MissingLink) => 400,
            Self::Translation(TranslateError::Encode { .. }) => 500,
            Self::DownstreamStatus { status, .. } => *status,
            Self::DownstreamTransport { .. } => GATEWAY_FAILURE_STATUS,
        }
    }

    /// Plain-text message safe to return across the trust boundary.
    pub fn public_message(&self) -> String {
        match self {
            Self::EmptyBody => "Error: Request Body is empty".to_string(),
            Self::Translation(TranslateError::Decode { .. }) => {
                "Error: Request Body is not a valid pull request event".to_string()
            }
            Self::Translation(TranslateError::MissingLink) => {
                "Error: Pull request event has no self link".to_string()
            }
            Self::Translation(TranslateError::Encode { .. }) => {
                "Error: Notification could not be encoded".to_string()
            }
            Self::DownstreamStatus { request_id, status } => format!(
                "Error: Downstream request ({request_id}) failed with HTTP status {status}"
            ),
            Self::DownstreamTransport { request_id, .. } => {
                format!("Error: Downstream request ({request_id}) could not be completed")
            }
        }
    }
}
