//! Telemetry and Observability
//!
//! Sets up `tracing-subscriber` for structured logging. The configured log
//! level can be shifted from the command line and overridden by `RUST_LOG`.
//! Output is pretty-printed in debug builds and JSON in release builds.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Shift a log level by `verbose - quiet` steps, clamped to error..trace.
///
/// Unknown levels are treated as "info".
pub fn adjust_level(level: &str, verbose: u8, quiet: u8) -> &'static str {
    let base = LEVELS.iter().position(|l| *l == level).unwrap_or(2) as i32;
    let shifted = (base + i32::from(verbose) - i32::from(quiet)).clamp(0, LEVELS.len() as i32 - 1);
    LEVELS[shifted as usize]
}

/// Initialize the tracing subscriber with the given log level.
///
/// Priority: `RUST_LOG` env var > `log_level` parameter.
pub fn init_telemetry_with_level(log_level: &str) {
    let default_filter = format!("{},huddle_engine={}", log_level, log_level);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&default_filter));

    #[cfg(debug_assertions)]
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty().with_target(false))
            .try_init()
            .ok();
    }

    #[cfg(not(debug_assertions))]
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_current_span(true))
            .try_init()
            .ok();
    }
}
