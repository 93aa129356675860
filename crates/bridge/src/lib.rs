//! Core relay domain for hookrelay.
//!
//! This crate contains the pull-request event model, the chat notification
//! model, the translator between them, and the relay service that decides what
//! to do with each inbound request. Infrastructure crates implement the
//! [`Downstream`] port defined here; they never add relay rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is sent downstream; the `downstream` crate defines *how*.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtypes (`RequestId`, `CredentialSegment`, `MentionToken`) |
//! | [`event`] | Inbound pull-request event document |
//! | [`notification`] | Outbound adaptive-card message |
//! | [`translate`] | Event → notification mapping |
//! | [`payload`] | Empty / ping / event body classification |
//! | [`redaction`] | Credential paths and their logged form |
//! | [`ports`] | The `Downstream` trait |
//! | [`relay`] | Request lifecycle and status mapping |
//! | [`errors`] | Translation and relay error types |

pub mod errors;
pub mod event;
pub mod identifiers;
pub mod notification;
pub mod payload;
pub mod ports;
pub mod redaction;
pub mod relay;
pub mod translate;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use errors::{RelayError, TranslateError, GATEWAY_FAILURE_STATUS};
pub use event::{Identity, Link, Links, Participant, PullRequest, SourceEvent};
pub use identifiers::{CredentialSegment, MentionToken, RequestId, REQUEST_ID_HEADER};
pub use notification::{MentionEntity, Notification};
pub use payload::Payload;
pub use ports::{Delivery, Downstream, DownstreamReply, TransportError};
pub use redaction::{fingerprint, observed_request_path, CredentialPath, RedactionPolicy};
pub use relay::{DownstreamEndpoint, Relay, RelayRequest, RelayResponse, RelaySettings};
pub use translate::{compose, translate, PullRequestAction};
