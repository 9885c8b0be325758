use serde::{Deserialize, Serialize};

/// Identity of whoever sent a chat line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatUser {
    /// Lower-case login name, used for identity checks.
    pub username: String,
    /// Name as the user chose to display it, used in replies.
    pub display_name: String,
}

impl ChatUser {
    pub fn new(username: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            display_name: display_name.into(),
        }
    }
}

/// One inbound chat message as delivered by a transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub channel: String,
    pub user: ChatUser,
    pub text: String,
}

impl ChatMessage {
    pub fn new(channel: impl Into<String>, user: ChatUser, text: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            user,
            text: text.into(),
        }
    }
}

/// A reply waiting for its slot in the outbound queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub channel: String,
    pub text: String,
}
