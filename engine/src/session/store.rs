//! Registries of live conversations and participants
//!
//! The supervisor reaches its state only through `SessionStore`, so a
//! different backing store can be swapped in without touching routing.
//! `MemoryStore` keeps everything in process memory and loses it on restart.

use std::collections::HashMap;

use crate::standup::{Standup, User, UserId};

/// What a destination id currently maps to
#[derive(Debug, Clone)]
pub enum Conversation {
    /// A group channel with a live standup
    Standup(Standup),
    /// A user's direct-message conversation while they are answering
    Direct(UserId),
}

/// Storage for conversations keyed by destination and users keyed by id
pub trait SessionStore: Send + Sync {
    fn conversation(&self, destination: &str) -> Option<&Conversation>;

    fn conversation_mut(&mut self, destination: &str) -> Option<&mut Conversation>;

    fn insert_conversation(
        &mut self,
        destination: String,
        conversation: Conversation,
    ) -> Option<Conversation>;

    fn remove_conversation(&mut self, destination: &str) -> Option<Conversation>;

    fn user(&self, user_id: &str) -> Option<&User>;

    fn user_mut(&mut self, user_id: &str) -> Option<&mut User>;

    fn insert_user(&mut self, user: User) -> Option<User>;

    fn remove_user(&mut self, user_id: &str) -> Option<User>;

    /// Channel ids of every live standup
    fn standup_ids(&self) -> Vec<String>;

    fn user_count(&self) -> usize;

    fn standup(&self, channel_id: &str) -> Option<&Standup> {
        match self.conversation(channel_id) {
            Some(Conversation::Standup(standup)) => Some(standup),
            _ => None,
        }
    }

    fn standup_mut(&mut self, channel_id: &str) -> Option<&mut Standup> {
        match self.conversation_mut(channel_id) {
            Some(Conversation::Standup(standup)) => Some(standup),
            _ => None,
        }
    }

    fn standup_count(&self) -> usize {
        self.standup_ids().len()
    }
}

/// In-process `SessionStore`
#[derive(Debug, Default)]
pub struct MemoryStore {
    conversations: HashMap<String, Conversation>,
    users: HashMap<UserId, User>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn conversation(&self, destination: &str) -> Option<&Conversation> {
        self.conversations.get(destination)
    }

    fn conversation_mut(&mut self, destination: &str) -> Option<&mut Conversation> {
        self.conversations.get_mut(destination)
    }

    fn insert_conversation(
        &mut self,
        destination: String,
        conversation: Conversation,
    ) -> Option<Conversation> {
        self.conversations.insert(destination, conversation)
    }

    fn remove_conversation(&mut self, destination: &str) -> Option<Conversation> {
        self.conversations.remove(destination)
    }

    fn user(&self, user_id: &str) -> Option<&User> {
        self.users.get(user_id)
    }

    fn user_mut(&mut self, user_id: &str) -> Option<&mut User> {
        self.users.get_mut(user_id)
    }

    fn insert_user(&mut self, user: User) -> Option<User> {
        self.users.insert(user.id.clone(), user)
    }

    fn remove_user(&mut self, user_id: &str) -> Option<User> {
        self.users.remove(user_id)
    }

    fn standup_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .conversations
            .iter()
            .filter(|(_, conversation)| matches!(conversation, Conversation::Standup(_)))
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    fn user_count(&self) -> usize {
        self.users.len()
    }
}
