//! Wire message exchanged with Slack's real time messaging socket.
//!
//! Inbound events carry many more fields than these four; unknown fields are
//! ignored and missing ones default to zero or empty.

use serde::{Deserialize, Serialize};

/// Event type of a chat message.
pub const MESSAGE_TYPE: &str = "message";

/// A message on the RTM socket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Outbound sequence id. Stamped by the transport on send; opaque on inbound.
    #[serde(default)]
    pub id: u64,
    /// Event type tag (`"message"`, `"hello"`, `"presence_change"`, ...).
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub text: String,
}

impl Message {
    /// Build an outbound chat message for `channel`.
    ///
    /// The id is left at zero; the transport assigns the real one.
    pub fn new(channel: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: 0,
            kind: MESSAGE_TYPE.to_string(),
            channel: channel.into(),
            text: text.into(),
        }
    }

    /// A reply posted to the channel this message came from.
    pub fn reply(&self, text: impl Into<String>) -> Self {
        Self::new(self.channel.clone(), text)
    }

    /// True for chat messages, false for presence, typing and other events.
    pub fn is_chat(&self) -> bool {
        self.kind == MESSAGE_TYPE
    }

    /// Text addressed to the user whose mention token is `mention`.
    ///
    /// Returns the text after the mention, trimmed, or `None` if this is not
    /// a chat message or does not start with the mention.
    pub fn addressed_to<'a>(&'a self, mention: &str) -> Option<&'a str> {
        if !self.is_chat() {
            return None;
        }
        self.text.strip_prefix(mention).map(str::trim)
    }
}

/// Mention token Slack uses for a user id, e.g. `<@U0ADC97QS>`.
pub fn mention_token(user_id: &str) -> String {
    format!("<@{user_id}>")
}
