//! Outbound chat notification: a Teams message carrying one adaptive card.
//!
//! The serialised shape is fixed by the incoming-webhook API:
//!
//! ```text
//! message
//! └── attachments[0]  (application/vnd.microsoft.card.adaptive)
//!     └── content     (AdaptiveCard 1.0)
//!         ├── body[0]           TextBlock, wrap = true
//!         └── msteams.entities  one MentionEntity per <at> token
//! ```
//!
//! Mention tokens must reach the card renderer as literal `<at>...</at>`
//! markup. `serde_json` never escapes `<` or `>`, so [`Notification::to_json`]
//! is a plain serialisation; the tests pin this down.

use serde::{Deserialize, Serialize};

use crate::errors::TranslateError;
use crate::identifiers::MentionToken;

const MESSAGE_TYPE: &str = "message";
const ADAPTIVE_CARD_CONTENT_TYPE: &str = "application/vnd.microsoft.card.adaptive";
const ADAPTIVE_CARD_TYPE: &str = "AdaptiveCard";
const ADAPTIVE_CARD_SCHEMA: &str = "http://adaptivecards.io/schemas/adaptive-card.json";
const ADAPTIVE_CARD_VERSION: &str = "1.0";
const TEXT_BLOCK_TYPE: &str = "TextBlock";
const MENTION_TYPE: &str = "mention";
const FULL_WIDTH: &str = "Full";

/// The document POSTed to the incoming-webhook endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "type")]
    pub kind: String,
    pub attachments: Vec<Attachment>,
}

impl Notification {
    /// Builds a message with a single card holding `text` and `entities`.
    pub fn adaptive_card(text: String, entities: Vec<MentionEntity>) -> Self {
        Self {
            kind: MESSAGE_TYPE.to_string(),
            attachments: vec![Attachment {
                content_type: ADAPTIVE_CARD_CONTENT_TYPE.to_string(),
                content: AdaptiveCard {
                    kind: ADAPTIVE_CARD_TYPE.to_string(),
                    body: vec![TextBlock {
                        kind: TEXT_BLOCK_TYPE.to_string(),
                        text,
                        wrap: true,
                    }],
                    schema: ADAPTIVE_CARD_SCHEMA.to_string(),
                    version: ADAPTIVE_CARD_VERSION.to_string(),
                    msteams: TeamsProperties {
                        width: FULL_WIDTH.to_string(),
                        entities,
                    },
                },
            }],
        }
    }

    /// Text of the card's first text block, if any.
    pub fn text(&self) -> Option<&str> {
        self.attachments
            .first()
            .and_then(|a| a.content.body.first())
            .map(|block| block.text.as_str())
    }

    /// Mention entities of the card, in document order.
    pub fn mentions(&self) -> &[MentionEntity] {
        self.attachments
            .first()
            .map(|a| a.content.msteams.entities.as_slice())
            .unwrap_or_default()
    }

    /// Serialises the notification with `<` and `>` left unescaped.
    ///
    /// # Errors
    ///
    /// Returns [`TranslateError::Encode`] if serialisation fails.
    pub fn to_json(&self) -> Result<Vec<u8>, TranslateError> {
        serde_json::to_vec(self).map_err(|e| TranslateError::Encode {
            message: e.to_string(),
        })
    }
}

/// A card attachment of a [`Notification`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub content_type: String,
    pub content: AdaptiveCard,
}

/// Adaptive card payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveCard {
    #[serde(rename = "type")]
    pub kind: String,
    pub body: Vec<TextBlock>,
    #[serde(rename = "$schema")]
    pub schema: String,
    pub version: String,
    pub msteams: TeamsProperties,
}

/// A text element of an [`AdaptiveCard`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
    pub wrap: bool,
}

/// Teams-specific card extensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamsProperties {
    pub width: String,
    pub entities: Vec<MentionEntity>,
}

/// Binds one inline [`MentionToken`] to the user it refers to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MentionEntity {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: MentionToken,
    pub mentioned: Mentioned,
}

impl MentionEntity {
    /// Creates a mention entity keyed by `id` (an email address) and labelled `name`.
    pub fn new(text: MentionToken, id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: MENTION_TYPE.to_string(),
            text,
            mentioned: Mentioned {
                id: id.into(),
                name: name.into(),
            },
        }
    }
}

/// Target of a [`MentionEntity`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mentioned {
    pub id: String,
    pub name: String,
}
