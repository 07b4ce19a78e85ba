//! Users and channels known to the bot

use sdk::types::{ChannelInfo, UserInfo};

/// Platform user id
pub type UserId = String;

/// A participant, registered while they have at least one active standup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub direct_destination: Option<String>,
    pub connected: bool,
    /// Channel ids of the standups this user is answering, oldest first
    pub active_standups: Vec<String>,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            direct_destination: None,
            connected: false,
            active_standups: Vec::new(),
        }
    }

    /// Mention form of this user
    pub fn tag(&self) -> String {
        tag(&self.id)
    }

    /// The standup currently being answered
    pub fn current_standup(&self) -> Option<&str> {
        self.active_standups.first().map(String::as_str)
    }

    pub fn is_in(&self, channel_id: &str) -> bool {
        self.active_standups.iter().any(|id| id == channel_id)
    }

    /// Record the direct-message destination opened for this user
    pub fn connect(&mut self, destination: impl Into<String>) {
        self.direct_destination = Some(destination.into());
        self.connected = true;
    }

    /// Queue a standup, returning false if it was already queued
    pub fn enqueue(&mut self, channel_id: &str) -> bool {
        if self.is_in(channel_id) {
            return false;
        }
        self.active_standups.push(channel_id.to_string());
        true
    }

    /// Remove a standup from the queue, returning whether it was present
    pub fn sit_down(&mut self, channel_id: &str) -> bool {
        match self.active_standups.iter().position(|id| id == channel_id) {
            Some(index) => {
                self.active_standups.remove(index);
                true
            }
            None => false,
        }
    }
}

impl From<UserInfo> for User {
    fn from(info: UserInfo) -> Self {
        Self::new(info.id, info.name)
    }
}

/// Mention form of a user id
pub fn tag(user_id: &str) -> String {
    format!("<@{}>", user_id)
}

/// A group channel with its member snapshot taken when the standup began
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: String,
    pub name: String,
    pub members: Vec<UserId>,
}

impl From<ChannelInfo> for Channel {
    fn from(info: ChannelInfo) -> Self {
        Self {
            id: info.id,
            name: info.name,
            members: info.members,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enqueue_is_deduplicated() {
        let mut user = User::new("U1", "ann");
        assert!(user.enqueue("C1"));
        assert!(user.enqueue("C2"));
        assert!(!user.enqueue("C1"));
        assert_eq!(user.active_standups, vec!["C1", "C2"]);
        assert_eq!(user.current_standup(), Some("C1"));
    }

    #[test]
    fn test_sit_down_advances_queue() {
        let mut user = User::new("U1", "ann");
        user.enqueue("C1");
        user.enqueue("C2");

        assert!(user.sit_down("C1"));
        assert_eq!(user.current_standup(), Some("C2"));
        assert!(!user.sit_down("C1"));
    }

    #[test]
    fn test_tag_and_connect() {
        let mut user = User::new("U1", "ann");
        assert_eq!(user.tag(), "<@U1>");
        assert!(!user.connected);

        user.connect("D1");
        assert!(user.connected);
        assert_eq!(user.direct_destination.as_deref(), Some("D1"));
    }
}
