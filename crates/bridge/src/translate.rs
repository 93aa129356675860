//! Pull-request event → chat notification translation.
//!
//! Pure functions, no I/O. [`translate`] is the byte-level entry point used by
//! the relay and by the `translate` command; [`compose`] is the structural
//! mapping underneath it.
//!
//! ## Message layout
//!
//! ```text
//! Hi Team, <at>author UPN</at> opened a PR, please review: [title](link) \n\n
//! CC: <at>rev1 UPN</at>, <at>rev2 UPN</at>
//! ```
//!
//! Mention entities list every reviewer in source order and then the author.

use tracing::{debug, warn};

use crate::errors::TranslateError;
use crate::event::SourceEvent;
use crate::identifiers::MentionToken;
use crate::notification::{MentionEntity, Notification};

const EVENT_KEY_PREFIX: &str = "pr:";

/// What happened to the pull request, derived from the event key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullRequestAction {
    /// `pr:opened`
    Opened,
    /// `pr:from_ref_updated`
    SourceBranchUpdated,
    /// Any other key, kept verbatim (prefix included).
    Other(String),
}

impl PullRequestAction {
    /// Classifies an event key such as `"pr:opened"`.
    pub fn from_event_key(event_key: &str) -> Self {
        match event_key.strip_prefix(EVENT_KEY_PREFIX) {
            Some("opened") => Self::Opened,
            Some("from_ref_updated") => Self::SourceBranchUpdated,
            _ => Self::Other(event_key.to_string()),
        }
    }

    /// Verb phrase used in the message sentence.
    pub fn phrase(&self) -> String {
        match self {
            Self::Opened => "opened a PR".to_string(),
            Self::SourceBranchUpdated => "updated source branch in PR".to_string(),
            Self::Other(event_key) => format!("(PR EventKey: {event_key})"),
        }
    }
}

/// Translates raw event JSON into notification JSON.
///
/// # Errors
///
/// - [`TranslateError::Decode`]: the bytes are not a pull-request event.
/// - [`TranslateError::MissingLink`]: the event has no self link.
/// - [`TranslateError::Encode`]: the notification could not be serialised.
pub fn translate(source_event: &[u8]) -> Result<Vec<u8>, TranslateError> {
    let event = SourceEvent::from_slice(source_event)?;
    compose(&event)?.to_json()
}

/// Builds the notification for a decoded event.
///
/// # Errors
///
/// Returns [`TranslateError::MissingLink`] if `pullRequest.links.self` is empty.
pub fn compose(event: &SourceEvent) -> Result<Notification, TranslateError> {
    let pull_request = &event.pull_request;
    let link = pull_request.self_link().ok_or(TranslateError::MissingLink)?;

    if pull_request.reviewers.is_empty() {
        warn!(
            event_key = %event.event_key,
            pull_request_id = ?pull_request.id,
            "Pull request has no reviewers; only the author will be mentioned"
        );
    }

    let mut entities = Vec::with_capacity(pull_request.reviewers.len() + 1);
    let mut cc = Vec::with_capacity(pull_request.reviewers.len());
    for reviewer in &pull_request.reviewers {
        let user = &reviewer.user;
        let token = MentionToken::for_login(&user.name);
        cc.push(token.to_string());
        entities.push(MentionEntity::new(token, &user.email_address, &user.display_name));
    }

    let author = &pull_request.author.user;
    let author_token = MentionToken::for_login(&author.name);
    let action = PullRequestAction::from_event_key(&event.event_key);

    let text = format!(
        "Hi Team, {author_token} {action}, please review: [{title}]({link}) \n\nCC: {cc}",
        action = action.phrase(),
        title = pull_request.title,
        cc = cc.join(", "),
    );
    entities.push(MentionEntity::new(author_token, &author.email_address, &author.display_name));

    let notification = Notification::adaptive_card(text, entities);
    debug!(
        event_key = %event.event_key,
        mentions = notification.mentions().len(),
        text = notification.text().unwrap_or_default(),
        "Composed pull request notification"
    );

    Ok(notification)
}

#[cfg(test)]
#[path = "translate_tests.rs"]
mod tests;
