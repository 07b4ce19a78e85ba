//! Session supervisor
//!
//! The supervisor owns the conversation and user registries. For every
//! inbound message it parses and routes the text, performs any directory
//! lookups the transition needs, then applies the state change in one
//! synchronous step and returns the messages to send as an `Outbox`.
//!
//! A lookup failure therefore never leaves a half-enrolled standup behind:
//! nothing is mutated until every lookup for that message has succeeded.

use std::collections::BTreeSet;

use chrono::{DateTime, TimeZone, Utc};
use sdk::errors::EngineError;
use sdk::transport::Directory;
use sdk::types::{BotIdentity, EventKind, InboundEvent};
use tracing::{debug, info, warn};

use super::parser::parse_command;
use super::router::{route, Context, ResetScope, Route};
use super::store::{Conversation, MemoryStore, SessionStore};
use crate::config::BotSettings;
use crate::daemon::SupervisorStats;
use crate::lang::{self, Command};
use crate::render;
use crate::standup::{tag, Channel, Standup, User};

/// Direct-message destination ids start with this character
pub const DIRECT_PREFIX: char = 'D';

/// Name used in help text before the bot knows its own identity
const FALLBACK_BOT_NAME: &str = "huddle";

/// Whether a destination id names a direct-message conversation
pub fn is_direct(destination: &str) -> bool {
    destination.starts_with(DIRECT_PREFIX)
}

/// Wall-clock time of an event, falling back to now for unusable stamps
fn event_time(timestamp: f64) -> DateTime<Utc> {
    let secs = timestamp.floor();
    let nanos = ((timestamp - secs) * 1e9) as u32;
    Utc.timestamp_opt(secs as i64, nanos)
        .single()
        .unwrap_or_else(Utc::now)
}

/// One message to deliver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
    pub destination: String,
    pub text: String,
}

/// Messages produced while handling one event, in send order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outbox {
    messages: Vec<Outgoing>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, destination: impl Into<String>, text: impl Into<String>) {
        self.messages.push(Outgoing {
            destination: destination.into(),
            text: text.into(),
        });
    }

    pub fn messages(&self) -> &[Outgoing] {
        &self.messages
    }

    /// Texts addressed to one destination, in order
    pub fn to(&self, destination: &str) -> Vec<&str> {
        self.messages
            .iter()
            .filter(|m| m.destination == destination)
            .map(|m| m.text.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl IntoIterator for Outbox {
    type Item = Outgoing;
    type IntoIter = std::vec::IntoIter<Outgoing>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.into_iter()
    }
}

/// A user resolved for enrollment, with their direct destination opened
struct Candidate {
    user: User,
    direct: String,
}

/// Owner of all standup state
pub struct Supervisor<S: SessionStore = MemoryStore> {
    store: S,
    settings: BotSettings,
    identity: Option<BotIdentity>,
}

impl Supervisor<MemoryStore> {
    /// Create a supervisor backed by an in-memory store
    pub fn new(settings: BotSettings) -> Self {
        Self::with_store(MemoryStore::new(), settings)
    }
}

impl<S: SessionStore> Supervisor<S> {
    pub fn with_store(store: S, settings: BotSettings) -> Self {
        Self {
            store,
            settings,
            identity: None,
        }
    }

    /// Adopt the identity of a fresh connection
    pub fn set_identity(&mut self, identity: BotIdentity) {
        self.identity = Some(identity);
    }

    pub fn identity(&self) -> Option<&BotIdentity> {
        self.identity.as_ref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> &BotSettings {
        &self.settings
    }

    /// Handle one inbound event
    ///
    /// # Errors
    ///
    /// Returns an error when a directory lookup fails or the registries are
    /// inconsistent. No state has been changed in either case.
    pub async fn handle_event(
        &mut self,
        event: &InboundEvent,
        directory: &dyn Directory,
        stats: &SupervisorStats,
    ) -> Result<Outbox, EngineError> {
        let mut outbox = Outbox::new();

        if event.kind != EventKind::Message || event.text.trim().is_empty() {
            return Ok(outbox);
        }
        if self
            .identity
            .as_ref()
            .is_some_and(|bot| bot.id == event.author)
        {
            return Ok(outbox);
        }

        let mention = self.identity.as_ref().map(BotIdentity::mention_token);
        let parsed = parse_command(&event.text, mention.as_deref());
        let destination = event.destination.as_str();
        let activity = event_time(event.timestamp);
        let context = Context {
            direct: is_direct(destination),
            active: self.store.conversation(destination).is_some(),
            mentioned: parsed.mentioned,
        };
        let next = route(
            context,
            Command::parse(&parsed.command),
            parsed.argument.as_deref(),
        );
        debug!(
            destination = %destination,
            user = %event.author,
            command = %parsed.command,
            route = ?next,
            "routed"
        );

        match next {
            Route::Ignore => {}
            Route::Echo(Some(text)) => outbox.push(destination, text),
            Route::Echo(None) => outbox.push(destination, lang::UNKNOWN_COMMAND),
            Route::Help => outbox.push(destination, lang::help(self.bot_name())),
            Route::Pong => outbox.push(destination, lang::PONG),
            Route::Uptime => outbox.push(destination, self.uptime(stats)),
            Route::NoStandup => outbox.push(destination, lang::NO_STANDUP),
            Route::BadCommand => outbox.push(destination, lang::UNKNOWN_COMMAND),
            Route::AlreadyStarted => {
                let name = self.channel_name(destination);
                outbox.push(destination, lang::standup_already(&name));
            }
            Route::Start => self.start(destination, directory, &mut outbox).await?,
            Route::Join => {
                self.join(destination, &event.author, activity, directory, &mut outbox)
                    .await?
            }
            Route::Cancel => {
                let name = self.channel_name(destination);
                info!(channel = %name, "standup cancelled");
                outbox.push(destination, lang::standup_cancelled(&name));
                self.unlink(destination, &mut outbox);
            }
            Route::Publish => self.publish_and_unlink(destination, &mut outbox),
            direct @ (Route::Record(..)
            | Route::Reset(_)
            | Route::ResetWhat
            | Route::Show
            | Route::Finish { .. }) => {
                self.handle_direct(destination, direct, activity, &mut outbox)?
            }
        }

        Ok(outbox)
    }

    /// Publish and close every standup idle longer than the idle timeout
    ///
    /// A standup is idle since its last participant message (or its start).
    /// Does nothing unless `standup_idle_timeout` is configured.
    pub fn sweep_idle(&mut self, now: DateTime<Utc>) -> Outbox {
        let mut outbox = Outbox::new();
        let Some(timeout) = self.settings.standup_idle_timeout else {
            return outbox;
        };

        let expired: Vec<String> = self
            .store
            .standup_ids()
            .into_iter()
            .filter(|id| {
                self.store.standup(id).is_some_and(|standup| {
                    (now - standup.last_activity())
                        .to_std()
                        .is_ok_and(|age| age > timeout)
                })
            })
            .collect();

        for channel_id in expired {
            info!(channel = %channel_id, "idle standup expired");
            self.publish_and_unlink(&channel_id, &mut outbox);
        }
        outbox
    }

    fn bot_name(&self) -> &str {
        self.identity
            .as_ref()
            .map_or(FALLBACK_BOT_NAME, |bot| bot.name.as_str())
    }

    fn channel_name(&self, channel_id: &str) -> String {
        self.store
            .standup(channel_id)
            .map_or_else(|| channel_id.to_string(), |s| s.channel().name.clone())
    }

    fn uptime(&self, stats: &SupervisorStats) -> String {
        lang::uptime(
            &stats.uptime(Utc::now()),
            stats.connect_count,
            stats.error_count,
            self.store.standup_count(),
            self.store.user_count(),
        )
    }

    /// Apply a status command sent in a user's direct conversation
    fn handle_direct(
        &mut self,
        destination: &str,
        next: Route,
        activity: DateTime<Utc>,
        outbox: &mut Outbox,
    ) -> Result<(), EngineError> {
        let user_id = match self.store.conversation(destination) {
            Some(Conversation::Direct(user_id)) => user_id.clone(),
            _ => {
                return Err(EngineError::Handling(format!(
                    "{} is not a direct conversation",
                    destination
                )))
            }
        };
        let channel_id = self
            .store
            .user(&user_id)
            .and_then(User::current_standup)
            .map(str::to_string)
            .ok_or_else(|| {
                EngineError::Handling(format!("user {} has no active standup", user_id))
            })?;
        let user_tag = tag(&user_id);

        let standup = self.store.standup_mut(&channel_id).ok_or_else(|| {
            EngineError::Handling(format!("standup {} is not registered", channel_id))
        })?;
        standup.touch(activity);
        let channel_name = standup.channel().name.clone();
        let updates = standup.updates_mut(&user_id).ok_or_else(|| {
            EngineError::Handling(format!(
                "user {} has no updates in {}",
                user_id, channel_name
            ))
        })?;

        let (status, finishing) = match next {
            Route::Record(category, entry) => {
                updates.push(category, entry);
                (lang::OK, false)
            }
            Route::Reset(ResetScope::All) => {
                updates.clear_all();
                (lang::OK, false)
            }
            Route::Reset(ResetScope::One(category)) => {
                updates.clear(category);
                (lang::OK, false)
            }
            Route::ResetWhat => (lang::RESET_WHAT, false),
            Route::Show => {
                outbox.push(destination, lang::preview(&render::block(&user_tag, updates)));
                (lang::OK, false)
            }
            Route::Finish { skip: true } => {
                updates.clear_all();
                (lang::SKIPPING, true)
            }
            Route::Finish { skip: false } => (lang::THANKS, true),
            other => {
                return Err(EngineError::Handling(format!(
                    "{:?} is not a direct transition",
                    other
                )))
            }
        };

        outbox.push(
            destination,
            lang::status_response(status, &channel_name, updates.counts()),
        );

        if finishing {
            self.finish(&user_id, &channel_id, &user_tag, outbox);
        }
        Ok(())
    }

    /// A user is done answering one standup
    fn finish(&mut self, user_id: &str, channel_id: &str, user_tag: &str, outbox: &mut Outbox) {
        outbox.push(channel_id, lang::sat_down(user_tag));

        let Some(remaining) = self.store.standup_mut(channel_id).map(Standup::finish_user) else {
            return;
        };
        info!(channel = %channel_id, user = %user_id, outstanding = remaining, "user sat down");

        if remaining == 0 {
            // Unlink sits every remaining user down, this one included
            self.publish_and_unlink(channel_id, outbox);
        } else {
            self.sit_down(user_id, channel_id, outbox);
        }
    }

    async fn start(
        &mut self,
        channel_id: &str,
        directory: &dyn Directory,
        outbox: &mut Outbox,
    ) -> Result<(), EngineError> {
        info!(channel = %channel_id, "starting standup");
        let channel = Channel::from(directory.resolve_channel(channel_id).await?);
        let ignore = self.settings.ignore_list(&channel.name);
        if !ignore.is_empty() {
            debug!(channel = %channel.name, ignore = ?ignore, "ignore list");
        }

        let candidates = self.gather(&channel.members, &ignore, directory).await?;
        self.open(channel, candidates, outbox);
        Ok(())
    }

    async fn join(
        &mut self,
        channel_id: &str,
        author: &str,
        activity: DateTime<Utc>,
        directory: &dyn Directory,
        outbox: &mut Outbox,
    ) -> Result<(), EngineError> {
        let channel = if self.store.standup(channel_id).is_some() {
            None
        } else {
            Some(Channel::from(directory.resolve_channel(channel_id).await?))
        };
        let candidates = self
            .gather(&[author.to_string()], &BTreeSet::new(), directory)
            .await?;

        if let Some(channel) = channel {
            self.open(channel, candidates, outbox);
            return Ok(());
        }

        if candidates.is_empty() {
            debug!(channel = %channel_id, user = %author, "join from a bot user");
            return Ok(());
        }

        let name = self.channel_name(channel_id);
        let delta = self.connect_users(channel_id, candidates, outbox);
        if let Some(standup) = self.store.standup_mut(channel_id) {
            standup.touch(activity);
        }
        if delta == 0 {
            outbox.push(channel_id, lang::already_in(&tag(author), &name));
        } else {
            info!(channel = %name, user = %author, "user joined");
            outbox.push(channel_id, lang::joined(&tag(author), &name));
        }
        Ok(())
    }

    /// Resolve users for enrollment without touching any state
    async fn gather(
        &self,
        user_ids: &[String],
        ignore: &BTreeSet<String>,
        directory: &dyn Directory,
    ) -> Result<Vec<Candidate>, EngineError> {
        let bot_id = self.identity.as_ref().map(|bot| bot.id.as_str());
        let mut candidates = Vec::new();

        for user_id in user_ids {
            if bot_id == Some(user_id.as_str()) {
                continue;
            }

            let user = match self.store.user(user_id) {
                Some(user) => user.clone(),
                None => {
                    let info = directory.resolve_user(user_id).await?;
                    if info.is_bot {
                        debug!(user = %info.name, "skipping bot");
                        continue;
                    }
                    User::from(info)
                }
            };

            if ignore.contains(&user.name) {
                info!(user = %user.name, "pass; ignored");
                continue;
            }

            let direct = match (&user.direct_destination, user.connected) {
                (Some(direct), true) => direct.clone(),
                _ => directory.open_direct(user_id).await?,
            };
            candidates.push(Candidate { user, direct });
        }

        Ok(candidates)
    }

    /// Register a new standup and enroll the gathered users
    fn open(&mut self, channel: Channel, candidates: Vec<Candidate>, outbox: &mut Outbox) {
        let channel_id = channel.id.clone();
        let name = channel.name.clone();
        self.store.insert_conversation(
            channel_id.clone(),
            Conversation::Standup(Standup::new(channel)),
        );

        let delta = self.connect_users(&channel_id, candidates, outbox);
        if delta > 0 {
            info!(channel = %name, outstanding = delta, "standup started");
            outbox.push(&channel_id, lang::standup_started(&name));
        } else {
            warn!(channel = %name, "no users to enroll");
            outbox.push(&channel_id, lang::STANDUP_EMPTY);
            self.unlink(&channel_id, outbox);
        }
    }

    /// Enroll users into a registered standup, returning how many were added
    fn connect_users(
        &mut self,
        channel_id: &str,
        candidates: Vec<Candidate>,
        outbox: &mut Outbox,
    ) -> usize {
        let Some(name) = self
            .store
            .standup(channel_id)
            .map(|s| s.channel().name.clone())
        else {
            return 0;
        };

        let mut delta = 0;
        for Candidate { user, direct } in candidates {
            let mut user = self.store.user(&user.id).cloned().unwrap_or(user);
            if user.is_in(channel_id) {
                debug!(user = %user.name, channel = %name, "already enrolled");
                continue;
            }

            if user.active_standups.is_empty() {
                outbox.push(&direct, lang::started(&name));
            }
            user.connect(direct.clone());
            user.enqueue(channel_id);

            self.store
                .insert_conversation(direct, Conversation::Direct(user.id.clone()));
            if let Some(standup) = self.store.standup_mut(channel_id) {
                standup.add_user(&user.id);
            }
            self.store.insert_user(user);
            delta += 1;
        }
        delta
    }

    /// Take one standup off a user's queue, then advance or evict them
    fn sit_down(&mut self, user_id: &str, channel_id: &str, outbox: &mut Outbox) {
        let Some(user) = self.store.user_mut(user_id) else {
            return;
        };
        if !user.sit_down(channel_id) {
            return;
        }
        let next = user.current_standup().map(str::to_string);
        let direct = user.direct_destination.clone();

        match next {
            Some(next_id) => {
                let name = self.channel_name(&next_id);
                debug!(user = %user_id, channel = %name, "next standup");
                if let Some(direct) = direct {
                    outbox.push(direct, lang::next(&name));
                }
            }
            None => {
                debug!(user = %user_id, "evicting user");
                self.store.remove_user(user_id);
                if let Some(direct) = direct {
                    let owned = matches!(
                        self.store.conversation(&direct),
                        Some(Conversation::Direct(id)) if id == user_id
                    );
                    if owned {
                        self.store.remove_conversation(&direct);
                    }
                }
            }
        }
    }

    fn publish_and_unlink(&mut self, channel_id: &str, outbox: &mut Outbox) {
        if let Some(standup) = self.store.standup(channel_id) {
            info!(
                channel = %standup.channel().name,
                started = %standup.start_time(),
                "publishing standup"
            );
            outbox.push(channel_id, render::publish(standup));
        }
        self.unlink(channel_id, outbox);
    }

    /// Tear a standup down, releasing every user still answering it
    fn unlink(&mut self, channel_id: &str, outbox: &mut Outbox) {
        if self.store.standup(channel_id).is_none() {
            return;
        }
        let Some(Conversation::Standup(standup)) = self.store.remove_conversation(channel_id)
        else {
            return;
        };
        let name = standup.channel().name.clone();
        debug!(channel = %name, "unlinking standup");

        for user_id in standup.users() {
            let direct = match self.store.user(user_id) {
                Some(user) if user.is_in(channel_id) => user.direct_destination.clone(),
                _ => continue,
            };
            if let Some(direct) = direct {
                outbox.push(direct, lang::standup_ended(&name));
            }
            self.sit_down(user_id, channel_id, outbox);
        }
    }
}
