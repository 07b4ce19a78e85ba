//! Event and identity types exchanged with chat adapters

use serde::{Deserialize, Serialize};

/// Kind of an inbound event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A plain chat message
    Message,
    /// Reply to one of our keepalive pings
    Pong,
    /// Anything else the platform sends (presence, typing, ...)
    Other(String),
}

/// A single inbound event from the chat platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundEvent {
    pub kind: EventKind,
    /// Channel, group or direct-message id the event arrived on
    pub destination: String,
    /// User id of the author
    pub author: String,
    pub text: String,
    /// Unix timestamp in seconds, as reported by the platform
    pub timestamp: f64,
}

impl InboundEvent {
    /// Create a message event
    pub fn message(
        destination: impl Into<String>,
        author: impl Into<String>,
        text: impl Into<String>,
        timestamp: f64,
    ) -> Self {
        Self {
            kind: EventKind::Message,
            destination: destination.into(),
            author: author.into(),
            text: text.into(),
            timestamp,
        }
    }

    /// Create a pong event
    pub fn pong(timestamp: f64) -> Self {
        Self {
            kind: EventKind::Pong,
            destination: String::new(),
            author: String::new(),
            text: String::new(),
            timestamp,
        }
    }

    /// Age of the event relative to `now` (both unix seconds)
    pub fn age(&self, now: f64) -> f64 {
        now - self.timestamp
    }
}

/// The bot's own identity, known once connected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotIdentity {
    pub id: String,
    pub name: String,
}

impl BotIdentity {
    /// Token other users type to address the bot
    pub fn mention_token(&self) -> String {
        format!("<@{}>", self.id)
    }
}

/// A group channel as reported by the directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub id: String,
    pub name: String,
    pub members: Vec<String>,
}

/// A user as reported by the directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_bot: bool,
}
