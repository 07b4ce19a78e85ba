//! Conversation handling
//!
//! Parsing, routing and the supervisor that applies routed transitions to
//! the standup registries.

pub mod parser;
pub mod router;
pub mod store;
pub mod supervisor;

pub use parser::{parse_command, unfurl, ParsedCommand};
pub use router::{route, Context, ResetScope, Route};
pub use store::{Conversation, MemoryStore, SessionStore};
pub use supervisor::{is_direct, Outbox, Outgoing, Supervisor};
