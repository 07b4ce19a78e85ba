//! In-memory chat collaborators for tests and dry runs
//!
//! `FakeTransport` replays scripted read results and records everything sent;
//! `FakeDirectory` answers lookups from fixed tables. Direct destinations are
//! `D` followed by the user id.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use sdk::errors::TransportError;
use sdk::transport::{ChatTransport, Directory, Result};
use sdk::types::{BotIdentity, ChannelInfo, InboundEvent, UserInfo};

use crate::daemon::now_unix;

/// Scripted `ChatTransport`
#[derive(Debug)]
pub struct FakeTransport {
    identity: BotIdentity,
    connected: bool,
    auto_pong: bool,
    reads: VecDeque<Result<Vec<InboundEvent>>>,
    connect_failures: VecDeque<TransportError>,
    sent: Vec<(String, String)>,
    connects: usize,
    disconnects: usize,
    pings: usize,
}

impl FakeTransport {
    pub fn new(bot_id: &str, bot_name: &str) -> Self {
        Self {
            identity: BotIdentity {
                id: bot_id.to_string(),
                name: bot_name.to_string(),
            },
            connected: false,
            auto_pong: true,
            reads: VecDeque::new(),
            connect_failures: VecDeque::new(),
            sent: Vec::new(),
            connects: 0,
            disconnects: 0,
            pings: 0,
        }
    }

    /// Stop answering pings with pongs
    pub fn without_pongs(mut self) -> Self {
        self.auto_pong = false;
        self
    }

    /// Queue a batch of events for a future read
    pub fn push_events(&mut self, events: Vec<InboundEvent>) {
        self.reads.push_back(Ok(events));
    }

    /// Queue a failure for a future read
    pub fn push_error(&mut self, error: TransportError) {
        self.reads.push_back(Err(error));
    }

    /// Make the next connect attempt fail
    pub fn fail_next_connect(&mut self, error: TransportError) {
        self.connect_failures.push_back(error);
    }

    pub fn sent(&self) -> &[(String, String)] {
        &self.sent
    }

    /// Texts sent to one destination, in order
    pub fn sent_to(&self, destination: &str) -> Vec<&str> {
        self.sent
            .iter()
            .filter(|(d, _)| d == destination)
            .map(|(_, text)| text.as_str())
            .collect()
    }

    pub fn connects(&self) -> usize {
        self.connects
    }

    pub fn disconnects(&self) -> usize {
        self.disconnects
    }

    pub fn pings(&self) -> usize {
        self.pings
    }

    pub fn pending_reads(&self) -> usize {
        self.reads.len()
    }
}

#[async_trait]
impl ChatTransport for FakeTransport {
    async fn connect(&mut self) -> Result<BotIdentity> {
        if let Some(error) = self.connect_failures.pop_front() {
            return Err(error);
        }
        self.connected = true;
        self.connects += 1;
        Ok(self.identity.clone())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn ping(&mut self) -> Result<()> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        self.pings += 1;
        if self.auto_pong {
            self.reads.push_front(Ok(vec![InboundEvent::pong(now_unix())]));
        }
        Ok(())
    }

    async fn read(&mut self) -> Result<Vec<InboundEvent>> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        match self.reads.pop_front() {
            Some(Err(TransportError::Closed(detail))) => {
                self.connected = false;
                Err(TransportError::Closed(detail))
            }
            Some(result) => result,
            None => Ok(Vec::new()),
        }
    }

    async fn send(&mut self, destination: &str, text: &str) -> Result<()> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        self.sent.push((destination.to_string(), text.to_string()));
        Ok(())
    }

    fn disconnect(&mut self) {
        if self.connected {
            self.disconnects += 1;
        }
        self.connected = false;
    }
}

/// Table-backed `Directory`
#[derive(Debug, Default, Clone)]
pub struct FakeDirectory {
    channels: HashMap<String, ChannelInfo>,
    users: HashMap<String, UserInfo>,
}

impl FakeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_channel(mut self, id: &str, name: &str, members: &[&str]) -> Self {
        self.channels.insert(
            id.to_string(),
            ChannelInfo {
                id: id.to_string(),
                name: name.to_string(),
                members: members.iter().map(|m| m.to_string()).collect(),
            },
        );
        self
    }

    pub fn with_user(self, id: &str, name: &str) -> Self {
        self.with_user_info(id, name, false)
    }

    pub fn with_bot(self, id: &str, name: &str) -> Self {
        self.with_user_info(id, name, true)
    }

    fn with_user_info(mut self, id: &str, name: &str, is_bot: bool) -> Self {
        self.users.insert(
            id.to_string(),
            UserInfo {
                id: id.to_string(),
                name: name.to_string(),
                is_bot,
            },
        );
        self
    }
}

#[async_trait]
impl Directory for FakeDirectory {
    async fn resolve_channel(&self, channel_id: &str) -> Result<ChannelInfo> {
        self.channels
            .get(channel_id)
            .cloned()
            .ok_or_else(|| TransportError::api("conversations.info", "channel_not_found"))
    }

    async fn resolve_user(&self, user_id: &str) -> Result<UserInfo> {
        self.users
            .get(user_id)
            .cloned()
            .ok_or_else(|| TransportError::api("users.info", "user_not_found"))
    }

    async fn open_direct(&self, user_id: &str) -> Result<String> {
        if self.users.contains_key(user_id) {
            Ok(format!("D{}", user_id))
        } else {
            Err(TransportError::api("conversations.open", "user_not_found"))
        }
    }
}
