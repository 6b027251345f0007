//! Rows shown in the message list.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Annotation attached to replies the server escalated.
pub const ESCALATION_NOTE: &str = "⚠️ Escalated to admin";

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// Typed by the person using the widget.
    User,
    /// Produced by the bot, including greetings and error fallbacks.
    Bot,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::Bot => f.write_str("bot"),
        }
    }
}

/// A single row in the message list. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    text: String,
    sender: Sender,
    meta: Option<String>,
}

impl Message {
    /// Create a message. Empty meta text is treated as none.
    pub fn new(text: impl Into<String>, sender: Sender, meta: Option<String>) -> Self {
        Self {
            text: text.into(),
            sender,
            meta: meta.filter(|m| !m.is_empty()),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(text, Sender::User, None)
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self::new(text, Sender::Bot, None)
    }

    /// A bot reply, annotated when the server escalated the query.
    pub fn reply(text: impl Into<String>, escalated: bool) -> Self {
        let meta = escalated.then(|| ESCALATION_NOTE.to_string());
        Self::new(text, Sender::Bot, meta)
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn sender(&self) -> Sender {
        self.sender
    }

    /// Secondary text rendered under the message body.
    #[must_use]
    pub fn meta(&self) -> Option<&str> {
        self.meta.as_deref()
    }
}
