//! Error types and handling
//!
//! This module provides the error types shared by the Huddle engine and the
//! chat adapters that feed it. Errors fall into a small taxonomy that the
//! connection supervisor uses to decide how to recover:
//!
//! - **Transport faults** (connection reset, timeout): force a reconnect after
//!   a fixed backoff
//! - **Protocol faults** (socket closed by the peer, API refusals): charged
//!   against the error budget, recovery deferred to the next loop iteration
//! - **Handling faults**: a single inbound event could not be processed; the
//!   event is logged and skipped
//! - **Budget exhaustion**: fatal, surfaced to the process supervisor
//!
//! All engine errors implement the `HuddleErrorExt` trait which provides
//! user-friendly hints and indicates whether errors are recoverable.

use thiserror::Error;

/// Trait for Huddle error extensions
///
/// Provides additional context for errors, including user-friendly hints and
/// recoverability information. All engine errors implement this trait.
pub trait HuddleErrorExt {
    /// Returns a user-friendly hint for the error
    ///
    /// The hint never contains tokens or raw platform payloads.
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors are absorbed by the running bot. Non-recoverable
    /// errors tear the bot down and hand control back to the daemon.
    fn is_recoverable(&self) -> bool;
}

/// How the connection supervisor reacts to a transport failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Drop the connection, back off, reconnect
    Transport,
    /// Count against the error budget, let the next iteration notice
    Protocol,
}

/// Failures reported by a chat transport or directory
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Connection reset: {0}")]
    ConnectionReset(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Connection closed: {0}")]
    Closed(String),

    #[error("Not connected")]
    NotConnected,

    #[error("API call {method} failed: {error}")]
    Api { method: String, error: String },

    #[error("Decode error: {0}")]
    Decode(String),
}

impl TransportError {
    /// Classify this error for the resilience loop
    pub fn fault(&self) -> Fault {
        match self {
            Self::ConnectionReset(_) | Self::Timeout(_) | Self::NotConnected => Fault::Transport,
            Self::Closed(_) | Self::Api { .. } | Self::Decode(_) => Fault::Protocol,
        }
    }

    /// Shorthand for an API refusal
    pub fn api(method: impl Into<String>, error: impl Into<String>) -> Self {
        Self::Api {
            method: method.into(),
            error: error.into(),
        }
    }
}

/// Main engine error type
///
/// # Examples
///
/// ```
/// use sdk::errors::{EngineError, HuddleErrorExt, TransportError};
///
/// let error = EngineError::from(TransportError::Timeout("rtm.read".to_string()));
/// assert!(error.is_recoverable());
///
/// let fatal = EngineError::ErrorBudgetExhausted { errors: 4, max: 3 };
/// assert!(!fatal.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Chat platform errors
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Error budget exhausted: {errors} consecutive errors (max {max})")]
    ErrorBudgetExhausted { errors: u32, max: u32 },

    // Per-event errors
    #[error("Event handling failed: {0}")]
    Handling(String),

    #[error("Unbalanced brackets in {0:?}")]
    Unfurl(String),
}

impl HuddleErrorExt for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Config(_) => "Check your config.toml file for errors",
            Self::Transport(TransportError::Api { .. }) => {
                "Slack refused the request. Check the bot token and its scopes"
            }
            Self::Transport(_) => "Connection to Slack failed. Check your network",
            Self::ErrorBudgetExhausted { .. } => "Too many consecutive errors. The bot will restart",
            Self::Handling(_) => "A message could not be processed and was skipped",
            Self::Unfurl(_) => "Message text contained unbalanced angle brackets",
        }
    }

    fn is_recoverable(&self) -> bool {
        !matches!(self, Self::ErrorBudgetExhausted { .. } | Self::Config(_))
    }
}
