//! Pure command routing
//!
//! `route` maps the context of a message and its parsed command to the
//! transition the supervisor should perform. It never touches state.

use crate::lang::Command;
use crate::standup::Category;

/// Where a message arrived and how it was addressed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Context {
    /// Sent in a direct-message conversation with the bot
    pub direct: bool,
    /// The destination has a live conversation in the registry
    pub active: bool,
    /// The message began with the bot's mention token
    pub mentioned: bool,
}

/// What a `reset` clears
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetScope {
    All,
    One(Category),
}

/// Transition selected for a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Not addressed to the bot
    Ignore,

    // Global replies
    Echo(Option<String>),
    Help,
    Pong,
    Uptime,

    // Direct conversation with an active standup
    Record(Category, String),
    Reset(ResetScope),
    ResetWhat,
    Show,
    Finish { skip: bool },

    // Replies without state change
    NoStandup,
    BadCommand,
    AlreadyStarted,

    // Channel lifecycle
    Start,
    Join,
    Cancel,
    Publish,
}

/// Select the transition for a parsed message
pub fn route(context: Context, command: Option<Command>, argument: Option<&str>) -> Route {
    if !(context.direct || context.mentioned) {
        return Route::Ignore;
    }

    match command {
        Some(Command::Echo) => return Route::Echo(argument.map(str::to_string)),
        Some(Command::Help) => return Route::Help,
        Some(Command::Ping) => return Route::Pong,
        Some(Command::Uptime) => return Route::Uptime,
        _ => {}
    }

    match (context.direct, context.active) {
        (true, true) => route_direct(command, argument),
        (true, false) => Route::NoStandup,
        (false, false) => match command {
            Some(Command::Start) => Route::Start,
            Some(Command::Join) => Route::Join,
            _ => Route::BadCommand,
        },
        (false, true) => match command {
            Some(Command::Join) => Route::Join,
            Some(Command::Start) => Route::AlreadyStarted,
            Some(Command::Cancel) => Route::Cancel,
            Some(Command::Publish) => Route::Publish,
            _ => Route::BadCommand,
        },
    }
}

fn route_direct(command: Option<Command>, argument: Option<&str>) -> Route {
    let Some(command) = command else {
        return Route::BadCommand;
    };

    if let (Some(category), Some(entry)) = (command.category(), argument) {
        return Route::Record(category, entry.to_string());
    }

    match command {
        Command::Reset => match argument {
            None => Route::Reset(ResetScope::All),
            Some(word) => match Command::parse(word).and_then(Command::category) {
                Some(category) => Route::Reset(ResetScope::One(category)),
                None => Route::ResetWhat,
            },
        },
        Command::Show => Route::Show,
        Command::Skip => Route::Finish { skip: true },
        Command::End => Route::Finish { skip: false },
        _ => Route::BadCommand,
    }
}
