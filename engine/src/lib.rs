//! Huddle Engine Library
//!
//! The standup bot core: command language, standup state, the supervisor
//! that turns Slack messages into replies, and the resilience loop that
//! keeps the connection alive. Used by the `huddle` binary and by the
//! integration tests.

/// Configuration management module
pub mod config;

/// Telemetry and Observability
pub mod telemetry;

/// Standup and participant state
pub mod standup;

/// Command vocabulary and reply templates
pub mod lang;

/// Standup report rendering
pub mod render;

/// Command parsing, routing and the supervisor
pub mod session;

/// Bot lifecycle and the resilience loop
pub mod daemon;

/// Slack Web API and RTM clients
pub mod bot;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;

/// In-memory transport and directory fakes for tests
pub mod testing;
