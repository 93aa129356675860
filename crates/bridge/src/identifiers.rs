//! Newtype domain identifiers.
//!
//! Every value that identifies something across a request (a correlation id, a
//! webhook credential, a mention token) is a distinct newtype. This prevents
//! accidentally interchanging, for example, a [`RequestId`] with a
//! [`CredentialSegment`] even though both are strings under the hood, and it
//! lets the credential type control how it is printed.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Correlation
// ---------------------------------------------------------------------------

/// Header carrying the [`RequestId`] inbound, outbound, and on responses.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

string_id! {
    /// Correlates one inbound request with its log lines and the downstream call.
    ///
    /// Taken from an inbound `X-Request-Id` header when the caller supplies one,
    /// otherwise generated with [`RequestId::new_random`]. Forwarded to the
    /// downstream service under the same header name.
    RequestId
}

impl RequestId {
    /// Generates a new random (UUID v4) request identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Uses `value` when it is a non-empty header value, else generates one.
    pub fn from_header_or_random(value: Option<&str>) -> Self {
        value
            .map(str::trim)
            .and_then(Self::new)
            .unwrap_or_else(Self::new_random)
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// One of the three opaque path segments of an incoming-webhook URL.
///
/// The segments act as bearer credentials for the downstream webhook. This
/// type implements neither `Display` nor `Serialize`, and its `Debug` output
/// never contains the value. Use [`CredentialSegment::expose`]
/// only where the cleartext is required (building the downstream URL, or
/// logging when the operator asked for maximum verbosity).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CredentialSegment(String);

impl CredentialSegment {
    /// Wraps a path segment.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the cleartext credential.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for CredentialSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CredentialSegment(<redacted>)")
    }
}

// ---------------------------------------------------------------------------
// Mentions
// ---------------------------------------------------------------------------

/// Inline mention markup understood by the chat client: `<at>{login} UPN</at>`.
///
/// The same token appears in the message text and in the matching
/// [`crate::notification::MentionEntity`]; the client pairs them by exact text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MentionToken(String);

impl MentionToken {
    /// Builds the token for a login name.
    pub fn for_login(login: &str) -> Self {
        Self(format!("<at>{login} UPN</at>"))
    }

    /// Returns the rendered token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MentionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[path = "identifiers_tests.rs"]
mod tests;
