//! CLI interface for Huddle
//!
//! This module provides the command-line interface using clap's derive API.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Huddle standup bot
///
/// Runs asynchronous standups in Slack: start one in a channel and the bot
/// collects everyone's updates over direct message, then publishes a report.
#[derive(Parser, Debug)]
#[command(name = "huddle")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// More log output (repeatable)
    #[arg(short, long, global = true, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Less log output (repeatable)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub quiet: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Connect to Slack and run the bot until interrupted
    Run,

    /// Validate the configuration and print the effective settings
    Check,

    /// Check the configuration and the Slack token
    Doctor,
}
