//! Command vocabulary and reply templates

use crate::standup::{Category, Counts};

/// Every command word the bot understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Done,
    Blocked,
    Goals,
    Reset,
    Show,
    Skip,
    End,
    Start,
    Join,
    Cancel,
    Publish,
    Echo,
    Help,
    Ping,
    Uptime,
}

const ALIASES: &[(Command, &[&str])] = &[
    (Command::Done, &["d", "d:", "did", "done", "finished", "completed"]),
    (Command::Blocked, &["b", "b:", "blocked", "block", "stuck"]),
    (Command::Goals, &["g", "g:", "goal", "goals", "will", "shall"]),
    (Command::Reset, &["reset"]),
    (Command::Show, &["show", "what"]),
    (Command::Skip, &["skip", "no"]),
    (Command::End, &["end"]),
    (Command::Start, &["start", "begin"]),
    (Command::Join, &["join", "add"]),
    (Command::Cancel, &["cancel"]),
    (Command::Publish, &["publish"]),
    (Command::Echo, &["echo"]),
    (Command::Help, &["help"]),
    (Command::Ping, &["ping"]),
    (Command::Uptime, &["uptime"]),
];

impl Command {
    /// Look up a command word, ignoring case
    pub fn parse(word: &str) -> Option<Self> {
        let word = word.to_lowercase();
        ALIASES
            .iter()
            .find(|(_, aliases)| aliases.contains(&word.as_str()))
            .map(|(command, _)| *command)
    }

    /// The status category a command writes to, if any
    pub fn category(self) -> Option<Category> {
        match self {
            Command::Done => Some(Category::Done),
            Command::Blocked => Some(Category::Blocked),
            Command::Goals => Some(Category::Goals),
            _ => None,
        }
    }
}

pub const OK: &str = "Ok";
pub const THANKS: &str = "Thanks";
pub const SKIPPING: &str = "Skipping you";
pub const RESET_WHAT: &str = "Reset what?";
pub const NO_STANDUP: &str = "No active standup.";
pub const UNKNOWN_COMMAND: &str = "Bad command. Try `help` if you need it.";
pub const PONG: &str = "pong";
pub const NONE: &str = "*None*";
pub const STANDUP_EMPTY: &str = "*There are no users in the standup!*";

pub fn help(bot_name: &str) -> String {
    format!(
        "Standup management (from a channel or private group):
  `@{name} start`       Start a standup. I will message everyone in the channel
  `@{name} join`        Join the standup in this channel, starting one if needed
  `@{name} cancel`      Cancel a standup that has been started
  `@{name} publish`     Publish a standup that has been started

Status entry (via direct message):
  `d: [...]`     Something you have done since the last standup
  `b: [...]`     A blocker that prevented you from getting something done
  `g: [...]`     A goal for today
  `end`     When you've no more to say
  `show`     If you're too lazy to scroll back
  `skip`     Nothing for today, disposes of anything you've entered
  `reset [...]`     Reset a status category, or all

Anywhere:
  `ping`, `echo [...]`, `uptime`, `help`
",
        name = bot_name
    )
}

pub fn started(channel_name: &str) -> String {
    format!(
        "Standup started for {}.\n\
         Use `d: ...`, `b: ...`, `g: ...` to report tasks done, blockers, and goals.\n\
         Type `end` when you're finished, or `help` if you need.\n",
        channel_name
    )
}

pub fn next(channel_name: &str) -> String {
    format!("Another standup, for {}, also started.", channel_name)
}

pub fn preview(block: &str) -> String {
    format!("Preview:\n  \n{}\n", block)
}

pub fn sat_down(tag: &str) -> String {
    format!("{} sat down.", tag)
}

pub fn standup_started(channel_name: &str) -> String {
    format!("Okay, {} standup started.", channel_name)
}

pub fn standup_ended(channel_name: &str) -> String {
    format!("*{} standup ended!*", channel_name)
}

pub fn standup_cancelled(channel_name: &str) -> String {
    format!("{} standup cancelled.", channel_name)
}

pub fn standup_already(channel_name: &str) -> String {
    format!("{} standup already started.", channel_name)
}

pub fn standup_for(channel_name: &str) -> String {
    format!("*Standup for {}*", channel_name)
}

pub fn joined(tag: &str, channel_name: &str) -> String {
    format!("{} joined the {} standup.", tag, channel_name)
}

pub fn already_in(tag: &str, channel_name: &str) -> String {
    format!("{} is already in the {} standup.", tag, channel_name)
}

pub fn status_response(status: &str, channel_name: &str, counts: Counts) -> String {
    format!("{}; channel:{}, {}", status, channel_name, counts)
}

pub fn uptime(
    uptime: &str,
    connects: u64,
    errors: u32,
    standups: usize,
    users: usize,
) -> String {
    format!(
        "up {}; connects:{}, errors:{}, standups:{}, users:{}",
        uptime, connects, errors, standups, users
    )
}
