//! Connection resilience loop
//!
//! Drives the read/dispatch cycle against a `ChatTransport`:
//! - connects when no connection is held
//! - pings every `keepalive_interval` and treats a ping left unanswered for
//!   `pong_timeout` as a dead connection
//! - drops messages older than `max_cmd_age`
//! - hands each remaining message to the supervisor and sends its outbox
//!
//! Failed cycles are charged against an error budget. Transport faults drop
//! the connection and back off for `reconnect_delay`; protocol faults only
//! count. Once more than `max_errors` consecutive cycles have failed the loop
//! returns `EngineError::ErrorBudgetExhausted`.

use chrono::Utc;
use sdk::errors::{EngineError, Fault, TransportError};
use sdk::transport::{ChatTransport, Directory};
use sdk::types::{EventKind, InboundEvent};
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, trace, warn};

use super::stats::SupervisorStats;
use crate::config::BotSettings;
use crate::session::{MemoryStore, Outbox, SessionStore, Supervisor};

/// Current unix time in seconds
pub fn now_unix() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// The read/dispatch loop for one bot instance
pub struct ResilienceLoop<T, D, S = MemoryStore>
where
    T: ChatTransport,
    D: Directory,
    S: SessionStore,
{
    transport: T,
    directory: D,
    supervisor: Supervisor<S>,
    settings: BotSettings,
    stats: SupervisorStats,
    /// When the oldest unanswered ping was sent
    awaiting_pong: Option<Instant>,
}

impl<T, D, S> ResilienceLoop<T, D, S>
where
    T: ChatTransport,
    D: Directory,
    S: SessionStore,
{
    pub fn new(transport: T, directory: D, supervisor: Supervisor<S>) -> Self {
        let settings = supervisor.settings().clone();
        Self {
            transport,
            directory,
            supervisor,
            settings,
            stats: SupervisorStats::new(),
            awaiting_pong: None,
        }
    }

    pub fn stats(&self) -> &SupervisorStats {
        &self.stats
    }

    pub fn supervisor(&self) -> &Supervisor<S> {
        &self.supervisor
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Run until the error budget is exhausted
    pub async fn run(&mut self) -> Result<(), EngineError> {
        loop {
            self.step().await?;
        }
    }

    /// One loop iteration: budget check, one cycle, failure accounting
    ///
    /// # Errors
    ///
    /// Returns `EngineError::ErrorBudgetExhausted` once `error_count` exceeds
    /// `max_errors`. Every other failure is absorbed.
    pub async fn step(&mut self) -> Result<(), EngineError> {
        if self.stats.error_count > self.settings.max_errors {
            error!(
                errors = self.stats.error_count,
                max = self.settings.max_errors,
                "error budget exhausted"
            );
            return Err(EngineError::ErrorBudgetExhausted {
                errors: self.stats.error_count,
                max: self.settings.max_errors,
            });
        }

        match self.cycle().await {
            Ok(()) => self.stats.error_count = 0,
            Err(err) => self.record_failure(err).await,
        }
        Ok(())
    }

    async fn record_failure(&mut self, err: TransportError) {
        self.stats.error_count += 1;
        match err.fault() {
            Fault::Transport => {
                warn!(
                    error = %err,
                    errors = self.stats.error_count,
                    "transport fault, reconnecting in {:?}",
                    self.settings.reconnect_delay
                );
                self.transport.disconnect();
                self.awaiting_pong = None;
                sleep(self.settings.reconnect_delay).await;
            }
            Fault::Protocol => {
                warn!(error = %err, errors = self.stats.error_count, "protocol fault");
            }
        }
    }

    async fn cycle(&mut self) -> Result<(), TransportError> {
        if !self.transport.is_connected() {
            self.connect().await?;
        }

        self.keepalive().await?;

        let swept = self.supervisor.sweep_idle(Utc::now());
        self.deliver(swept).await?;

        let events = self.transport.read().await?;
        if events.is_empty() {
            sleep(self.settings.main_loop_sleep).await;
            return Ok(());
        }

        for event in events {
            self.dispatch(event).await?;
        }
        Ok(())
    }

    async fn connect(&mut self) -> Result<(), TransportError> {
        debug!("connecting");
        let identity = self.transport.connect().await?;

        self.stats.connect_count += 1;
        self.stats.last_connected = Some(Utc::now());
        self.stats.last_ping = None;
        self.stats.last_pong = None;
        self.awaiting_pong = None;

        info!(
            name = %identity.name,
            prefix = %identity.mention_token(),
            connects = self.stats.connect_count,
            "connected"
        );
        self.supervisor.set_identity(identity);
        Ok(())
    }

    async fn keepalive(&mut self) -> Result<(), TransportError> {
        let now = Instant::now();

        if let Some(since) = self.awaiting_pong {
            let waited = now.duration_since(since);
            if waited > self.settings.pong_timeout {
                return Err(TransportError::Timeout(format!(
                    "no pong for {:.1}s",
                    waited.as_secs_f64()
                )));
            }
        }

        let due = self
            .stats
            .last_ping
            .map_or(true, |last| now.duration_since(last) > self.settings.keepalive_interval);
        if due {
            self.transport.ping().await?;
            self.stats.last_ping = Some(now);
            self.awaiting_pong.get_or_insert(now);
            trace!("ping");
        }
        Ok(())
    }

    async fn dispatch(&mut self, event: InboundEvent) -> Result<(), TransportError> {
        match &event.kind {
            EventKind::Pong => {
                self.stats.last_pong = Some(Instant::now());
                self.awaiting_pong = None;
                trace!("pong");
            }
            EventKind::Message => {
                let age = event.age(now_unix());
                if age > self.settings.max_cmd_age.as_secs_f64() {
                    warn!(
                        age = age,
                        destination = %event.destination,
                        "too old; dropping message"
                    );
                    return Ok(());
                }

                debug!(destination = %event.destination, user = %event.author, "handling");
                let result = self
                    .supervisor
                    .handle_event(&event, &self.directory, &self.stats)
                    .await;
                match result {
                    Ok(outbox) => self.deliver(outbox).await?,
                    Err(err) => {
                        error!(
                            error = %err,
                            destination = %event.destination,
                            "handling failure"
                        );
                    }
                }
            }
            EventKind::Other(kind) => trace!(kind = %kind, "ignoring event"),
        }
        Ok(())
    }

    async fn deliver(&mut self, outbox: Outbox) -> Result<(), TransportError> {
        for message in outbox {
            self.transport
                .send(&message.destination, &message.text)
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeDirectory, FakeTransport};
    use std::time::Duration;

    fn settings() -> BotSettings {
        BotSettings::default()
    }

    fn resilience(transport: FakeTransport) -> ResilienceLoop<FakeTransport, FakeDirectory> {
        let directory = FakeDirectory::new()
            .with_channel("C1", "dev", &["U1"])
            .with_user("U1", "ann");
        ResilienceLoop::new(transport, directory, Supervisor::new(settings()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_connects_and_pings_on_first_step() {
        let mut resilience = resilience(FakeTransport::new("UBOT", "huddle"));
        resilience.step().await.unwrap();

        assert_eq!(resilience.stats().connect_count, 1);
        assert!(resilience.stats().last_connected.is_some());
        assert_eq!(resilience.transport().pings(), 1);
        assert_eq!(
            resilience.supervisor().identity().map(|b| b.id.as_str()),
            Some("UBOT")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_pong_clears_pending_ping() {
        let mut resilience = resilience(FakeTransport::new("UBOT", "huddle"));
        resilience.step().await.unwrap();

        assert!(resilience.stats().last_pong.is_some());
        assert!(resilience.awaiting_pong.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_error_resets_on_success() {
        let mut transport = FakeTransport::new("UBOT", "huddle");
        transport.push_events(Vec::new());
        transport.push_error(TransportError::api("rtm.read", "hiccup"));
        let mut resilience = resilience(transport);

        // pong batch, then the empty batch, then the failure
        resilience.step().await.unwrap();
        resilience.step().await.unwrap();
        resilience.step().await.unwrap();
        assert_eq!(resilience.stats().error_count, 1);

        resilience.step().await.unwrap();
        assert_eq!(resilience.stats().error_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_fault_sleeps_reconnect_delay() {
        let mut transport = FakeTransport::new("UBOT", "huddle");
        transport.push_error(TransportError::ConnectionReset("peer".to_string()));
        let mut resilience = resilience(transport);
        resilience.step().await.unwrap();

        let before = Instant::now();
        resilience.step().await.unwrap();
        assert!(before.elapsed() >= Duration::from_secs(1));
        assert_eq!(resilience.transport().disconnects(), 1);
        assert!(!resilience.transport().is_connected());
    }
}
