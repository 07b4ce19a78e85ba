//! Standup data model
//!
//! A `Standup` is one status-collection session bound to a single group
//! channel. It owns the `Updates` of every enrolled participant and counts
//! how many of them are still answering.

mod entities;
mod updates;

pub use entities::{tag, Channel, User, UserId};
pub use updates::{Category, Counts, Updates};

use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// An active standup in one channel
#[derive(Debug, Clone)]
pub struct Standup {
    channel: Channel,
    outstanding: usize,
    /// Enrollment order, which is also publish order
    users: Vec<UserId>,
    updates: HashMap<UserId, Updates>,
    started_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
}

impl Standup {
    pub fn new(channel: Channel) -> Self {
        Self::started_at(channel, Utc::now())
    }

    /// Create a standup with an explicit start time
    pub fn started_at(channel: Channel, started_at: DateTime<Utc>) -> Self {
        tracing::debug!(channel = %channel.name, id = %channel.id, "standup initialized");
        Self {
            channel,
            outstanding: 0,
            users: Vec::new(),
            updates: HashMap::new(),
            started_at,
            last_activity: started_at,
        }
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Number of enrolled users still answering
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Enrolled users in enrollment order
    pub fn users(&self) -> &[UserId] {
        &self.users
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Latest participant activity, never earlier than the start
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    /// Record participant activity at `at`
    pub fn touch(&mut self, at: DateTime<Utc>) {
        self.last_activity = self.last_activity.max(at);
    }

    pub fn updates(&self, user_id: &str) -> Option<&Updates> {
        self.updates.get(user_id)
    }

    pub fn updates_mut(&mut self, user_id: &str) -> Option<&mut Updates> {
        self.updates.get_mut(user_id)
    }

    /// Enroll a user as answering
    ///
    /// A user who already finished and rejoins keeps their entries and their
    /// original position in the report.
    pub fn add_user(&mut self, user_id: &str) {
        if !self.updates.contains_key(user_id) {
            self.users.push(user_id.to_string());
            self.updates.insert(user_id.to_string(), Updates::new());
        }
        self.outstanding += 1;
    }

    /// Mark one user as finished and return how many are left
    pub fn finish_user(&mut self) -> usize {
        self.outstanding = self.outstanding.saturating_sub(1);
        self.outstanding
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel() -> Channel {
        Channel {
            id: "C1".to_string(),
            name: "dev".to_string(),
            members: vec!["U1".to_string(), "U2".to_string()],
        }
    }

    #[test]
    fn test_add_user_creates_empty_updates() {
        let mut standup = Standup::new(channel());
        standup.add_user("U1");
        standup.add_user("U2");

        assert_eq!(standup.outstanding(), 2);
        assert_eq!(standup.users(), ["U1".to_string(), "U2".to_string()]);
        assert!(standup.updates("U1").is_some_and(Updates::is_empty));
    }

    #[test]
    fn test_touch_only_moves_forward() {
        let start = Utc::now();
        let mut standup = Standup::started_at(channel(), start);

        standup.touch(start - chrono::Duration::seconds(30));
        assert_eq!(standup.last_activity(), start);

        let later = start + chrono::Duration::seconds(30);
        standup.touch(later);
        assert_eq!(standup.last_activity(), later);
        assert_eq!(standup.start_time(), start);
    }

    #[test]
    fn test_finish_user_saturates() {
        let mut standup = Standup::new(channel());
        standup.add_user("U1");

        assert_eq!(standup.finish_user(), 0);
        assert_eq!(standup.finish_user(), 0);
    }

    #[test]
    fn test_rejoin_keeps_updates_and_order() {
        let mut standup = Standup::new(channel());
        standup.add_user("U1");
        standup.add_user("U2");
        if let Some(updates) = standup.updates_mut("U1") {
            updates.push(Category::Done, "wrote code");
        }
        standup.finish_user();

        standup.add_user("U1");
        assert_eq!(standup.outstanding(), 2);
        assert_eq!(standup.users().len(), 2);
        assert_eq!(standup.updates("U1").map(|u| u.counts().done), Some(1));
    }
}
