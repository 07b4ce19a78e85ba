// Huddle standup bot
// Main entry point for the huddle binary

use clap::Parser;
use huddle_engine::cli::{Cli, Command};
use huddle_engine::config::Config;
use huddle_engine::handlers::{handle_check, handle_doctor, handle_run, OutputFormat};
use huddle_engine::telemetry::{adjust_level, init_telemetry_with_level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration (or use custom path if provided)
    let config = if let Some(config_path) = &cli.config {
        Config::load_from_path(config_path)?
    } else {
        Config::load_or_create()?
    };

    // --log replaces the configured level; -v/-q shift whichever one wins
    // (RUST_LOG still overrides both)
    let base_level = cli.log.as_deref().unwrap_or(&config.core.log_level);
    init_telemetry_with_level(adjust_level(base_level, cli.verbose, cli.quiet));

    let version = env!("CARGO_PKG_VERSION");
    let commit = env!("GIT_COMMIT_HASH");
    let timestamp = env!("BUILD_TIMESTAMP");

    tracing::info!("Huddle v{} ({} - {})", version, commit, timestamp);

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    match cli.command {
        Command::Run => {
            tracing::info!("Starting bot...");
            handle_run(&config).await
        }
        Command::Check => handle_check(&config, format),
        Command::Doctor => handle_doctor(&config, format).await,
    }
}
