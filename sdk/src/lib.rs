//! Huddle SDK
//!
//! Shared library providing the error taxonomy, event types and collaborator
//! traits used between the Huddle engine and chat platform adapters.

/// Error types and handling
pub mod errors;

/// Inbound event and identity types
pub mod types;

/// Chat transport and directory traits
pub mod transport;

// Re-export commonly used types
pub use errors::{EngineError, Fault, HuddleErrorExt, TransportError};
pub use transport::{ChatTransport, Directory};
pub use types::{BotIdentity, ChannelInfo, EventKind, InboundEvent, UserInfo};
