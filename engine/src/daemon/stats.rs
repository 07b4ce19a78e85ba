//! Connection metrics kept by the resilience loop

use chrono::{DateTime, Utc};
use tokio::time::Instant;

/// Counters and timestamps describing the bot's connection history
///
/// Owned by the resilience loop and lent read-only to the supervisor so it
/// can answer `uptime`.
#[derive(Debug, Clone)]
pub struct SupervisorStats {
    pub connect_count: u64,
    /// Consecutive failed cycles
    pub error_count: u32,
    pub initialized_at: DateTime<Utc>,
    pub last_connected: Option<DateTime<Utc>>,
    pub last_ping: Option<Instant>,
    pub last_pong: Option<Instant>,
}

impl SupervisorStats {
    pub fn new() -> Self {
        Self {
            connect_count: 0,
            error_count: 0,
            initialized_at: Utc::now(),
            last_connected: None,
            last_ping: None,
            last_pong: None,
        }
    }

    /// Time since the stats were created, formatted like `2d 3h 4m 5s`
    pub fn uptime(&self, now: DateTime<Utc>) -> String {
        format_duration((now - self.initialized_at).num_seconds().max(0) as u64)
    }
}

impl Default for SupervisorStats {
    fn default() -> Self {
        Self::new()
    }
}

fn format_duration(total_secs: u64) -> String {
    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = total_secs % 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{}d", days));
    }
    if days > 0 || hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if days > 0 || hours > 0 || minutes > 0 {
        parts.push(format!("{}m", minutes));
    }
    parts.push(format!("{}s", seconds));
    parts.join(" ")
}
