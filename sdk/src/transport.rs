//! Collaborator traits the engine is driven through
//!
//! The engine never talks to a chat platform directly. A `ChatTransport`
//! delivers inbound events and carries outbound text; a `Directory` answers
//! identity questions. Both are implemented by platform adapters and by the
//! in-memory fakes used in tests.

use async_trait::async_trait;

use crate::errors::TransportError;
use crate::types::{BotIdentity, ChannelInfo, InboundEvent, UserInfo};

/// Result type for transport and directory operations
pub type Result<T> = std::result::Result<T, TransportError>;

/// A persistent real-time connection to the chat platform
#[async_trait]
pub trait ChatTransport: Send {
    /// Open a fresh connection and return the bot's identity on it
    ///
    /// A new connection yields events starting from "now"; nothing from a
    /// previous connection is replayed.
    async fn connect(&mut self) -> Result<BotIdentity>;

    /// Whether a connection handle is currently held
    fn is_connected(&self) -> bool;

    /// Send a keepalive ping
    async fn ping(&mut self) -> Result<()>;

    /// Pull the next batch of inbound events, possibly empty
    ///
    /// Events are returned in delivery order.
    async fn read(&mut self) -> Result<Vec<InboundEvent>>;

    /// Send text to a channel or direct destination, best-effort
    async fn send(&mut self, destination: &str, text: &str) -> Result<()>;

    /// Drop the current connection handle, if any
    fn disconnect(&mut self);
}

/// Identity lookups against the chat platform
#[async_trait]
pub trait Directory: Send + Sync {
    /// Resolve a channel or private group by id, including its members
    async fn resolve_channel(&self, channel_id: &str) -> Result<ChannelInfo>;

    /// Resolve a user by id
    async fn resolve_user(&self, user_id: &str) -> Result<UserInfo>;

    /// Open (or reuse) the direct-message destination for a user
    async fn open_direct(&self, user_id: &str) -> Result<String>;
}
