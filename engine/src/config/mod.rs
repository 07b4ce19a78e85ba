//! Configuration management
//!
//! This module handles loading, validation, and management of the Huddle
//! configuration. Configuration is stored in TOML format at
//! ~/.huddle/config.toml unless a path is given on the command line.
//!
//! # Configuration Sections
//!
//! - **core**: Log level
//! - **slack**: Bot token and Web API settings
//! - **bot**: Connection supervisor thresholds (keepalive, error budget, sleeps)
//! - **channels**: Per-channel ignore lists, plus a `global` entry applied everywhere
//!
//! The engine never reads the TOML tree directly. `Config::settings()` flattens
//! the `bot` and `channels` sections into `BotSettings`, which is what the
//! session supervisor and resilience loop consume.
//!
//! # Examples
//!
//! ```no_run
//! use huddle_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_or_create()?;
//! let settings = config.settings();
//! println!("Keepalive: {:?}", settings.keepalive_interval);
//! # Ok(())
//! # }
//! ```

use sdk::errors::EngineError;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides `slack.token`
pub const TOKEN_ENV_VAR: &str = "HUDDLE_SLACK_TOKEN";

/// Name of the channel entry whose ignore list applies to every channel
pub const GLOBAL_CHANNEL: &str = "global";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Core settings
    #[serde(default)]
    pub core: CoreConfig,

    /// Slack credentials and Web API settings
    #[serde(default)]
    pub slack: SlackConfig,

    /// Connection supervisor thresholds
    #[serde(default)]
    pub bot: BotConfig,

    /// Per-channel settings keyed by channel name
    #[serde(default)]
    pub channels: BTreeMap<String, ChannelConfig>,
}

/// Core configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Slack configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackConfig {
    /// Bot token (xoxb-...). `HUDDLE_SLACK_TOKEN` takes precedence.
    #[serde(default)]
    pub token: String,

    /// Base URL for the Slack Web API
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Timeout for a single Web API request (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// Connection supervisor configuration
///
/// All durations are in (fractional) seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Interval between keepalive pings
    #[serde(default = "default_keepalive")]
    pub keepalive_secs: f64,

    /// Inbound messages older than this are dropped
    #[serde(default = "default_max_cmd_age")]
    pub max_cmd_age_secs: f64,

    /// Consecutive failed cycles tolerated before the bot is recycled
    #[serde(default = "default_max_errors")]
    pub max_errors: u32,

    /// Backoff before reconnecting after a transport fault
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_secs: f64,

    /// Pause before the daemon restarts a failed bot
    #[serde(default = "default_recycle_delay")]
    pub recycle_delay_secs: f64,

    /// Sleep taken when a read returns no events
    #[serde(default = "default_main_loop_sleep")]
    pub main_loop_sleep_secs: f64,

    /// A ping left unanswered this long marks the connection dead
    #[serde(default = "default_pong_timeout")]
    pub pong_timeout_secs: f64,

    /// Publish and close standups that stay open longer than this (disabled if unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standup_idle_timeout_secs: Option<f64>,
}

/// Per-channel configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Display names never enrolled by `start` in this channel
    #[serde(default, deserialize_with = "deserialize_name_list")]
    pub ignore: Vec<String>,
}

/// Flat, read-only view of the settings the engine consumes
#[derive(Debug, Clone, PartialEq)]
pub struct BotSettings {
    pub keepalive_interval: Duration,
    pub max_cmd_age: Duration,
    pub max_errors: u32,
    pub reconnect_delay: Duration,
    pub recycle_delay: Duration,
    pub main_loop_sleep: Duration,
    pub pong_timeout: Duration,
    pub standup_idle_timeout: Option<Duration>,
    ignore: BTreeMap<String, BTreeSet<String>>,
}

impl BotSettings {
    /// Display names to skip when starting a standup in `channel_name`
    ///
    /// The `global` list applies to every channel.
    pub fn ignore_list(&self, channel_name: &str) -> BTreeSet<String> {
        let mut names = self.ignore.get(GLOBAL_CHANNEL).cloned().unwrap_or_default();
        if let Some(channel) = self.ignore.get(channel_name) {
            names.extend(channel.iter().cloned());
        }
        names
    }

    /// Replace the ignore list for one channel
    pub fn with_ignore<I, S>(mut self, channel_name: &str, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore.insert(
            channel_name.to_string(),
            names.into_iter().map(Into::into).collect(),
        );
        self
    }
}

impl Default for BotSettings {
    fn default() -> Self {
        BotConfig::default().settings(&BTreeMap::new())
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_api_base() -> String {
    "https://slack.com/api".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_keepalive() -> f64 {
    3.0
}

fn default_max_cmd_age() -> f64 {
    30.0
}

fn default_max_errors() -> u32 {
    3
}

fn default_reconnect_delay() -> f64 {
    1.0
}

fn default_recycle_delay() -> f64 {
    20.0
}

fn default_main_loop_sleep() -> f64 {
    0.1
}

fn default_pong_timeout() -> f64 {
    30.0
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_base: default_api_base(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            keepalive_secs: default_keepalive(),
            max_cmd_age_secs: default_max_cmd_age(),
            max_errors: default_max_errors(),
            reconnect_delay_secs: default_reconnect_delay(),
            recycle_delay_secs: default_recycle_delay(),
            main_loop_sleep_secs: default_main_loop_sleep(),
            pong_timeout_secs: default_pong_timeout(),
            standup_idle_timeout_secs: None,
        }
    }
}

impl BotConfig {
    fn settings(&self, channels: &BTreeMap<String, ChannelConfig>) -> BotSettings {
        BotSettings {
            keepalive_interval: Duration::from_secs_f64(self.keepalive_secs),
            max_cmd_age: Duration::from_secs_f64(self.max_cmd_age_secs),
            max_errors: self.max_errors,
            reconnect_delay: Duration::from_secs_f64(self.reconnect_delay_secs),
            recycle_delay: Duration::from_secs_f64(self.recycle_delay_secs),
            main_loop_sleep: Duration::from_secs_f64(self.main_loop_sleep_secs),
            pong_timeout: Duration::from_secs_f64(self.pong_timeout_secs),
            standup_idle_timeout: self.standup_idle_timeout_secs.map(Duration::from_secs_f64),
            ignore: channels
                .iter()
                .map(|(name, channel)| (name.clone(), channel.ignore.iter().cloned().collect()))
                .collect(),
        }
    }

    fn validate(&self) -> Result<(), EngineError> {
        let durations = [
            ("keepalive_secs", Some(self.keepalive_secs)),
            ("max_cmd_age_secs", Some(self.max_cmd_age_secs)),
            ("reconnect_delay_secs", Some(self.reconnect_delay_secs)),
            ("recycle_delay_secs", Some(self.recycle_delay_secs)),
            ("main_loop_sleep_secs", Some(self.main_loop_sleep_secs)),
            ("pong_timeout_secs", Some(self.pong_timeout_secs)),
            ("standup_idle_timeout_secs", self.standup_idle_timeout_secs),
        ];

        for (name, value) in durations {
            if let Some(value) = value {
                if !value.is_finite() || value <= 0.0 {
                    return Err(EngineError::Config(format!(
                        "bot.{} must be a positive number of seconds, got {}",
                        name, value
                    )));
                }
                if Duration::try_from_secs_f64(value).is_err() {
                    return Err(EngineError::Config(format!(
                        "bot.{} is too large, got {}",
                        name, value
                    )));
                }
            }
        }

        if self.pong_timeout_secs <= self.keepalive_secs {
            return Err(EngineError::Config(
                "bot.pong_timeout_secs must be greater than bot.keepalive_secs".to_string(),
            ));
        }

        Ok(())
    }
}

impl Config {
    /// Load configuration from the default location (~/.huddle/config.toml)
    ///
    /// If the configuration file doesn't exist, creates a default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file cannot be read or written
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_or_create() -> Result<Self, EngineError> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::create_default(&config_path)
        }
    }

    /// Load configuration from a specific path
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, TOML parsing fails, or
    /// validation fails.
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, EngineError> {
        let mut config: Config = toml::from_str(contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate_and_process()?;

        Ok(config)
    }

    /// Create default configuration and save to path
    fn create_default(path: &Path) -> Result<Self, EngineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let mut config = Self::default_config();
        config.validate_and_process()?;

        let toml_string = toml::to_string_pretty(&config)
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| EngineError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(config)
    }

    /// Get the default configuration file path (~/.huddle/config.toml)
    fn default_config_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".huddle").join("config.toml"))
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        let mut channels = BTreeMap::new();
        channels.insert(GLOBAL_CHANNEL.to_string(), ChannelConfig::default());

        Self {
            core: CoreConfig::default(),
            slack: SlackConfig::default(),
            bot: BotConfig::default(),
            channels,
        }
    }

    /// Flatten the bot and channel sections into engine settings
    pub fn settings(&self) -> BotSettings {
        self.bot.settings(&self.channels)
    }

    /// The bot token, preferring the environment over the file
    pub fn token(&self) -> Option<String> {
        std::env::var(TOKEN_ENV_VAR)
            .ok()
            .filter(|token| !token.trim().is_empty())
            .or_else(|| Some(self.slack.token.clone()).filter(|token| !token.trim().is_empty()))
    }

    /// Validate and process configuration
    ///
    /// Normalizes ignore lists (trimmed, empty entries dropped) and checks
    /// every threshold.
    fn validate_and_process(&mut self) -> Result<(), EngineError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        let api_base = self.slack.api_base.trim_end_matches('/').to_string();
        if !(api_base.starts_with("https://") || api_base.starts_with("http://")) {
            return Err(EngineError::Config(format!(
                "slack.api_base must be an http(s) URL, got '{}'",
                self.slack.api_base
            )));
        }
        self.slack.api_base = api_base;

        if self.slack.request_timeout_secs == 0 {
            return Err(EngineError::Config(
                "slack.request_timeout_secs must be at least 1".to_string(),
            ));
        }

        self.bot.validate()?;

        for channel in self.channels.values_mut() {
            channel.ignore = channel
                .ignore
                .iter()
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect();
        }

        Ok(())
    }
}

/// Accept either a TOML array of names or a comma-separated string
fn deserialize_name_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NameList {
        List(Vec<String>),
        Csv(String),
    }

    Ok(match NameList::deserialize(deserializer)? {
        NameList::List(names) => names,
        NameList::Csv(text) => text.split(',').map(str::to_string).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_creation() {
        let config = Config::default_config();

        assert_eq!(config.core.log_level, "info");
        assert_eq!(config.slack.api_base, "https://slack.com/api");
        assert_eq!(config.bot.max_errors, 3);
        assert!(config.channels.contains_key(GLOBAL_CHANNEL));
    }

    #[test]
    fn test_default_settings_match_bot_defaults() {
        let settings = Config::default_config().settings();

        assert_eq!(settings.keepalive_interval, Duration::from_secs(3));
        assert_eq!(settings.max_cmd_age, Duration::from_secs(30));
        assert_eq!(settings.reconnect_delay, Duration::from_secs(1));
        assert_eq!(settings.recycle_delay, Duration::from_secs(20));
        assert_eq!(settings.main_loop_sleep, Duration::from_millis(100));
        assert!(settings.standup_idle_timeout.is_none());
    }

    #[test]
    fn test_ignore_list_merges_global() {
        let config = Config::from_toml_str(
            r#"
[channels.global]
ignore = ["deploybot"]

[channels.dev]
ignore = " alice , bob,"
"#,
        )
        .unwrap();

        let ignore = config.settings().ignore_list("dev");
        assert_eq!(ignore.len(), 3);
        assert!(ignore.contains("alice"));
        assert!(ignore.contains("bob"));
        assert!(ignore.contains("deploybot"));

        let other = config.settings().ignore_list("ops");
        assert_eq!(other.into_iter().collect::<Vec<_>>(), vec!["deploybot"]);
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let err = Config::from_toml_str("[core]\nlog_level = \"loud\"\n").unwrap_err();
        assert!(err.to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_non_positive_duration_rejected() {
        let err = Config::from_toml_str("[bot]\nmain_loop_sleep_secs = 0.0\n").unwrap_err();
        assert!(err.to_string().contains("main_loop_sleep_secs"));
    }

    #[test]
    fn test_oversized_duration_rejected() {
        let err = Config::from_toml_str("[bot]\nkeepalive_secs = 1e30\npong_timeout_secs = 1e31\n")
            .unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
        assert!(err.to_string().contains("keepalive_secs is too large"));

        let err = Config::from_toml_str("[bot]\nstandup_idle_timeout_secs = 1e300\n").unwrap_err();
        assert!(err.to_string().contains("standup_idle_timeout_secs"));
    }

    #[test]
    fn test_pong_timeout_must_exceed_keepalive() {
        let err =
            Config::from_toml_str("[bot]\nkeepalive_secs = 10.0\npong_timeout_secs = 5.0\n")
                .unwrap_err();
        assert!(err.to_string().contains("pong_timeout_secs"));
    }

    #[test]
    fn test_api_base_trailing_slash_trimmed() {
        let config =
            Config::from_toml_str("[slack]\napi_base = \"http://localhost:9000/api/\"\n").unwrap();
        assert_eq!(config.slack.api_base, "http://localhost:9000/api");
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default_config();
        let toml_string = toml::to_string(&config).unwrap();

        let deserialized: Config = toml::from_str(&toml_string).unwrap();
        assert_eq!(config.core.log_level, deserialized.core.log_level);
        assert_eq!(config.bot.max_errors, deserialized.bot.max_errors);
    }
}
