//! Inbound chat messages and the keys they are grouped by.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies one conversation channel. The conversation id is absent for
/// direct channels that do not belong to a larger conversation space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationKey {
    /// Optional enclosing conversation (server, workspace, guild).
    pub conversation_id: Option<u64>,
    /// The channel or thread inside the conversation.
    pub channel_id: u64,
}

impl ConversationKey {
    /// Creates a new `ConversationKey`.
    pub fn new(conversation_id: Option<u64>, channel_id: u64) -> Self {
        Self { conversation_id, channel_id }
    }
}

/// Identity of a burst: one author in one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BurstKey {
    /// Optional enclosing conversation.
    pub conversation_id: Option<u64>,
    /// The channel the messages were posted in.
    pub channel_id: u64,
    /// The author of the messages.
    pub author_id: u64,
}

impl BurstKey {
    /// Creates a new `BurstKey`.
    pub fn new(conversation_id: Option<u64>, channel_id: u64, author_id: u64) -> Self {
        Self { conversation_id, channel_id, author_id }
    }

    /// The conversation this burst belongs to.
    pub fn conversation(&self) -> ConversationKey {
        ConversationKey::new(self.conversation_id, self.channel_id)
    }
}

impl fmt::Display for BurstKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.conversation_id {
            Some(conversation) => {
                write!(f, "{}/{}/{}", conversation, self.channel_id, self.author_id)
            }
            None => write!(f, "-/{}/{}", self.channel_id, self.author_id),
        }
    }
}

/// One inbound chat message as delivered by the host transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Optional enclosing conversation.
    #[serde(default)]
    pub conversation_id: Option<u64>,
    /// The channel the message was posted in.
    pub channel_id: u64,
    /// The author of the message.
    pub author_id: u64,
    /// Whether the author is an automated account.
    #[serde(default)]
    pub is_bot: bool,
    /// The message content.
    #[serde(default)]
    pub text: String,
}

impl InboundMessage {
    /// The burst this message contributes to.
    pub fn burst_key(&self) -> BurstKey {
        BurstKey::new(self.conversation_id, self.channel_id, self.author_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_key_display() {
        assert_eq!(BurstKey::new(Some(1), 2, 3).to_string(), "1/2/3");
        assert_eq!(BurstKey::new(None, 2, 3).to_string(), "-/2/3");
    }

    #[test]
    fn test_inbound_message_defaults() {
        let msg: InboundMessage =
            serde_json::from_str(r#"{"channel_id": 10, "author_id": 7}"#).unwrap();
        assert_eq!(msg.conversation_id, None);
        assert!(!msg.is_bot);
        assert!(msg.text.is_empty());
        assert_eq!(msg.burst_key(), BurstKey::new(None, 10, 7));
        assert_eq!(msg.burst_key().conversation(), ConversationKey::new(None, 10));
    }
}
