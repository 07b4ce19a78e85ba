//! Bot lifecycle management
//!
//! This module runs the bot as a long-lived process. It handles:
//! - Building a Slack connection, supervisor and resilience loop
//! - Restarting the whole bot after a fatal failure, once `recycle_delay`
//!   has passed (all in-flight standups are lost on restart)
//! - Clean shutdown on Ctrl-C
//!
//! # Examples
//!
//! ```no_run
//! use huddle_engine::config::Config;
//! use huddle_engine::daemon;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_or_create()?;
//! daemon::run_forever(&config).await?;
//! # Ok(())
//! # }
//! ```

pub mod resilience;
pub mod stats;

pub use resilience::{now_unix, ResilienceLoop};
pub use stats::SupervisorStats;

use std::future::Future;
use std::time::Duration;

use sdk::errors::{EngineError, HuddleErrorExt};
use tokio::time::sleep;
use tracing::{error, info};

use crate::bot::{SlackRtm, SlackWebApi};
use crate::config::Config;
use crate::session::Supervisor;

/// Result type for daemon operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Build one bot instance and run it until it fails
pub async fn run_once(config: &Config) -> Result<()> {
    let api = SlackWebApi::from_config(config)?;
    let transport = SlackRtm::new(api.clone());
    let supervisor = Supervisor::new(config.settings());

    let mut resilience = ResilienceLoop::new(transport, api, supervisor);
    resilience.run().await
}

/// Run the bot until Ctrl-C, restarting it after every failure
///
/// # Errors
///
/// Returns configuration errors, which a restart cannot fix.
pub async fn run_forever(config: &Config) -> Result<()> {
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl-C, shutting down");
    };

    recycle(|| run_once(config), config.settings().recycle_delay, shutdown).await
}

/// Keep restarting `start` until `shutdown` resolves
///
/// A bot instance that returns `Ok` ends the loop. Configuration errors are
/// returned; every other error is logged and followed by `recycle_delay`.
pub async fn recycle<F, Fut, S>(mut start: F, recycle_delay: Duration, shutdown: S) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<()>>,
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => return Ok(()),
            result = start() => match result {
                Ok(()) => return Ok(()),
                Err(err @ EngineError::Config(_)) => return Err(err),
                Err(err) => {
                    error!(
                        error = %err,
                        hint = err.user_hint(),
                        "bot failed; restarting in {:?}",
                        recycle_delay
                    );
                }
            },
        }

        tokio::select! {
            _ = &mut shutdown => return Ok(()),
            _ = sleep(recycle_delay) => {}
        }
    }
}
