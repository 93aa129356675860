//! Webhook credential paths and how they appear in logs.
//!
//! An incoming-webhook URL carries three opaque credentials in its path:
//! `/webhookb2/{id1}/IncomingWebhook/{id2}/{id3}`. Unless the operator runs at
//! debug or trace verbosity, every logged form of that path replaces each
//! credential with a short SHA-256 fingerprint. Fingerprints are stable, so a
//! given webhook can still be followed across log lines.

use sha2::{Digest, Sha256};
use tracing::level_filters::LevelFilter;

use crate::identifiers::CredentialSegment;

const ROUTE_PREFIX: &str = "webhookb2";
const ROUTE_MIDDLE: &str = "IncomingWebhook";

/// Hex characters kept from each credential's SHA-256 digest.
pub const FINGERPRINT_LEN: usize = 7;

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Whether credentials may be logged in cleartext.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedactionPolicy {
    /// Log credentials as-is. Only when the operator asked for debug/trace output.
    Reveal,
    /// Log fingerprints instead of credentials.
    Fingerprint,
}

impl RedactionPolicy {
    /// Derives the policy from the configured log level and trace threshold.
    ///
    /// Credentials are revealed when `level` is `DEBUG` or `TRACE`, or when
    /// `trace_level` is non-negative (trace output enabled).
    pub fn from_verbosity(level: LevelFilter, trace_level: i64) -> Self {
        if level >= LevelFilter::DEBUG || trace_level >= 0 {
            Self::Reveal
        } else {
            Self::Fingerprint
        }
    }
}

/// First [`FINGERPRINT_LEN`] hex characters of the SHA-256 of `value`.
pub fn fingerprint(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    let mut encoded = hex::encode(digest);
    encoded.truncate(FINGERPRINT_LEN);
    encoded
}

// ---------------------------------------------------------------------------
// Credential path
// ---------------------------------------------------------------------------

/// The three credential segments of an incoming-webhook path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialPath {
    pub id1: CredentialSegment,
    pub id2: CredentialSegment,
    pub id3: CredentialSegment,
}

impl CredentialPath {
    /// Creates a path from its three segments.
    pub fn new(
        id1: impl Into<String>,
        id2: impl Into<String>,
        id3: impl Into<String>,
    ) -> Self {
        Self {
            id1: CredentialSegment::new(id1),
            id2: CredentialSegment::new(id2),
            id3: CredentialSegment::new(id3),
        }
    }

    /// The cleartext path, credentials included. Used to build the downstream URL.
    pub fn expose(&self) -> String {
        render(self.id1.expose(), self.id2.expose(), self.id3.expose())
    }

    /// The path as it may appear in logs under `policy`.
    pub fn observed(&self, policy: RedactionPolicy) -> String {
        match policy {
            RedactionPolicy::Reveal => self.expose(),
            RedactionPolicy::Fingerprint => render(
                &fingerprint(self.id1.expose()),
                &fingerprint(self.id2.expose()),
                &fingerprint(self.id3.expose()),
            ),
        }
    }
}

fn render(id1: &str, id2: &str, id3: &str) -> String {
    format!("/{ROUTE_PREFIX}/{id1}/{ROUTE_MIDDLE}/{id2}/{id3}")
}

/// The form of a request path that may appear in logs under `policy`.
///
/// Under [`RedactionPolicy::Fingerprint`] every non-empty segment after a
/// `webhookb2` segment is fingerprinted, except the literal `IncomingWebhook`.
/// This holds for any segment count, so malformed webhook paths (trailing
/// slash, missing or extra segments) are redacted as well. Other paths are
/// returned unchanged.
pub fn observed_request_path(path: &str, policy: RedactionPolicy) -> String {
    if policy == RedactionPolicy::Reveal {
        return path.to_string();
    }

    let mut in_credentials = false;
    let observed: Vec<String> = path
        .split('/')
        .map(|segment| {
            if in_credentials && !segment.is_empty() && segment != ROUTE_MIDDLE {
                fingerprint(segment)
            } else {
                if segment.eq_ignore_ascii_case(ROUTE_PREFIX) {
                    in_credentials = true;
                }
                segment.to_string()
            }
        })
        .collect();
    observed.join("/")
}

#[cfg(test)]
#[path = "redaction_tests.rs"]
mod tests;
