//! hookrelay inbound HTTP surfaces.
//!
//! Hosts three `axum` routers:
//!
//! - [`create_relay_router`] serves the incoming-webhook path
//!   `/webhookb2/{id1}/IncomingWebhook/{id2}/{id3}` and hands every request to
//!   the [`bridge::Relay`].
//! - [`create_health_router`] answers liveness checks on a separate listener so
//!   that these checks never share a port (or a failure mode) with relay traffic.
//! - [`create_echo_router`] is a local stand-in for the downstream webhook
//!   service, used when exercising the relay without a real chat tenant.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Routing, request-id propagation, access logging, and
//! request timeouts live here. Relay decisions (what to reject, what to
//! forward, which status to return) stay in [`bridge::Relay`].
//!
//! ## Log Redaction
//!
//! The access-log middleware is the only place request paths are written to
//! logs. It always writes the form returned by
//! [`bridge::observed_request_path`], so webhook credentials are fingerprinted
//! unless the operator runs at debug or trace verbosity.

pub mod echo;
pub mod handlers;
pub mod middleware;
pub mod server;

#[cfg(test)]
mod test_logs;

pub use echo::{create_echo_router, serve_echo};
pub use server::{create_health_router, create_relay_router, serve, ServeSettings};
