//! Classification of inbound request bodies.
//!
//! The upstream platform sends `{"test": true}` when an operator presses
//! "Test connection". The ping is recognised structurally, so any formatting
//! of that single-field object counts; anything else non-empty is treated as
//! an event and handed to the translator.

use serde::Deserialize;

/// What an inbound body turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload<'a> {
    /// No body, or only whitespace.
    Empty,
    /// The platform's connectivity check.
    Ping,
    /// Anything else: expected to be a pull-request event.
    Event(&'a [u8]),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PingSentinel {
    test: bool,
}

impl<'a> Payload<'a> {
    /// Classifies a raw request body.
    pub fn classify(body: &'a [u8]) -> Self {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Self::Empty;
        }

        match serde_json::from_slice::<PingSentinel>(body) {
            Ok(PingSentinel { test: true }) => Self::Ping,
            _ => Self::Event(body),
        }
    }
}

#[cfg(test)]
#[path = "payload_tests.rs"]
mod tests;
