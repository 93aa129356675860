//! Inbound pull-request event document as delivered by Bitbucket Server.
//!
//! Only the fields the translator reads (plus a few carried for log context)
//! are modelled; every other field in the upstream payload is ignored. Identity
//! strings default to empty when absent because the platform omits them for
//! some service accounts, and an empty mention key is still renderable. An
//! explicit `null` is read the same way as an absent field.

use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::TranslateError;

// ---------------------------------------------------------------------------
// Event envelope
// ---------------------------------------------------------------------------

/// A pull-request lifecycle event (`pr:opened`, `pr:from_ref_updated`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceEvent {
    /// Lifecycle transition tag, e.g. `"pr:opened"`.
    pub event_key: String,

    /// Event time as sent by the platform (not normalised; log context only).
    #[serde(default)]
    pub date: Option<String>,

    /// The user whose action produced the event.
    #[serde(default)]
    pub actor: Option<Identity>,

    /// The pull request the event refers to.
    pub pull_request: PullRequest,
}

impl SourceEvent {
    /// Deserialises an event from raw JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`TranslateError::Decode`] when the bytes are not JSON or do not
    /// match the event structure.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, TranslateError> {
        serde_json::from_slice(bytes).map_err(|e| TranslateError::Decode {
            message: e.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Pull request
// ---------------------------------------------------------------------------

/// The pull-request record embedded in a [`SourceEvent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    /// Repository-scoped pull-request number.
    #[serde(default)]
    pub id: Option<u64>,

    /// Pull-request title, rendered as the link text.
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,

    /// The pull-request author.
    pub author: Participant,

    /// Reviewers in the order the platform lists them.
    #[serde(default, deserialize_with = "null_as_default")]
    pub reviewers: Vec<Participant>,

    /// Hyperlinks to the pull request in the platform's web UI.
    #[serde(default, deserialize_with = "null_as_default")]
    pub links: Links,
}

impl PullRequest {
    /// Returns the first self-link, the clickable target of the notification.
    pub fn self_link(&self) -> Option<&str> {
        self.links.self_links.first().map(|link| link.href.as_str())
    }
}

/// Link collection of a [`PullRequest`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Links {
    /// `links.self`, usually exactly one entry.
    #[serde(rename = "self", default, deserialize_with = "null_as_default")]
    pub self_links: Vec<Link>,
}

/// A single hyperlink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
}

// ---------------------------------------------------------------------------
// People
// ---------------------------------------------------------------------------

/// A user attached to a pull request in some role (author or reviewer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub user: Identity,

    /// `"AUTHOR"`, `"REVIEWER"` or `"PARTICIPANT"`.
    #[serde(default)]
    pub role: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub approved: bool,

    /// `"APPROVED"`, `"UNAPPROVED"` or `"NEEDS_WORK"`.
    #[serde(default)]
    pub status: Option<String>,
}

/// A platform user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Login name; builds the mention token.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    /// Email address; the chat platform resolves mentions by this key.
    #[serde(default, deserialize_with = "null_as_default")]
    pub email_address: String,

    /// Human-readable name shown as the mention label.
    #[serde(default, deserialize_with = "null_as_default")]
    pub display_name: String,
}

/// Reads `null` as the type's default value.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
