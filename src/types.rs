//! JSON types exchanged over `POST /api/chat`.
//!
//! Both the widget's HTTP transport and the server use these, so the
//! wire contract lives in exactly one place.

use serde::{Deserialize, Serialize};

/// Request body sent by the widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The user's message, already trimmed by the widget.
    ///
    /// Absent or `null` on the wire is read as an empty message.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub message: String,
}

impl ChatRequest {
    /// Create a request for the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Response body returned by the chat endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    /// Text to show as the bot's message.
    pub reply: String,
    /// Whether the query was routed to a human administrator.
    #[serde(default)]
    pub escalated: bool,
    /// Best FAQ similarity score, when the server reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
}

impl ChatReply {
    /// A reply answered without escalation.
    pub fn answered(reply: impl Into<String>, similarity: f64) -> Self {
        Self {
            reply: reply.into(),
            escalated: false,
            similarity: Some(similarity),
        }
    }

    /// A reply that was forwarded to an administrator.
    pub fn escalated(reply: impl Into<String>, similarity: f64) -> Self {
        Self {
            reply: reply.into(),
            escalated: true,
            similarity: Some(similarity),
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
