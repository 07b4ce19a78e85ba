//! Command handlers for CLI operations
//!
//! - run: connect to Slack and run the bot until Ctrl-C
//! - check: validate configuration and print the effective settings
//! - doctor: check configuration and the Slack token

use anyhow::{Context, Result};
use serde_json::json;

use crate::bot::SlackWebApi;
use crate::config::{Config, TOKEN_ENV_VAR};
use crate::daemon;

/// Output format for command results
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

/// Run the bot until interrupted
pub async fn handle_run(config: &Config) -> Result<()> {
    daemon::run_forever(config)
        .await
        .context("Huddle stopped")
}

/// Print the settings the bot would run with
pub fn handle_check(config: &Config, format: OutputFormat) -> Result<()> {
    let settings = config.settings();
    let token_source = if std::env::var(TOKEN_ENV_VAR).is_ok_and(|t| !t.trim().is_empty()) {
        "environment"
    } else if config.token().is_some() {
        "config file"
    } else {
        "missing"
    };

    let ignore: Vec<(String, Vec<String>)> = config
        .channels
        .keys()
        .map(|name| (name.clone(), settings.ignore_list(name).into_iter().collect()))
        .collect();

    match format {
        OutputFormat::Text => {
            println!("Huddle Configuration");
            println!("====================");
            println!();
            println!("  {:<25} {}", "Log level:", config.core.log_level);
            println!("  {:<25} {}", "Slack API:", config.slack.api_base);
            println!("  {:<25} {}", "Token:", token_source);
            println!("  {:<25} {:?}", "Keepalive:", settings.keepalive_interval);
            println!("  {:<25} {:?}", "Pong timeout:", settings.pong_timeout);
            println!("  {:<25} {:?}", "Max command age:", settings.max_cmd_age);
            println!("  {:<25} {}", "Max errors:", settings.max_errors);
            println!("  {:<25} {:?}", "Reconnect delay:", settings.reconnect_delay);
            println!("  {:<25} {:?}", "Recycle delay:", settings.recycle_delay);
            println!("  {:<25} {:?}", "Main loop sleep:", settings.main_loop_sleep);
            match settings.standup_idle_timeout {
                Some(idle) => println!("  {:<25} {:?}", "Standup idle timeout:", idle),
                None => println!("  {:<25} off", "Standup idle timeout:"),
            }

            println!();
            println!("Ignored users:");
            for (channel, names) in &ignore {
                let names = if names.is_empty() {
                    "(none)".to_string()
                } else {
                    names.join(", ")
                };
                println!("  {:<25} {}", format!("{}:", channel), names);
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "log_level": config.core.log_level,
                "api_base": config.slack.api_base,
                "token": token_source,
                "keepalive_secs": settings.keepalive_interval.as_secs_f64(),
                "pong_timeout_secs": settings.pong_timeout.as_secs_f64(),
                "max_cmd_age_secs": settings.max_cmd_age.as_secs_f64(),
                "max_errors": settings.max_errors,
                "reconnect_delay_secs": settings.reconnect_delay.as_secs_f64(),
                "recycle_delay_secs": settings.recycle_delay.as_secs_f64(),
                "main_loop_sleep_secs": settings.main_loop_sleep.as_secs_f64(),
                "standup_idle_timeout_secs": settings.standup_idle_timeout.map(|d| d.as_secs_f64()),
                "ignore": ignore
                    .iter()
                    .map(|(channel, names)| (channel.clone(), json!(names)))
                    .collect::<serde_json::Map<String, serde_json::Value>>(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

/// Validate configuration and check the Slack token against `auth.test`
pub async fn handle_doctor(config: &Config, format: OutputFormat) -> Result<()> {
    let mut issues = Vec::new();
    let mut checks: Vec<(&str, String)> = Vec::new();

    // Loading already validated the file
    checks.push(("Configuration", "Valid".to_string()));

    match SlackWebApi::from_config(config) {
        Ok(api) => {
            checks.push(("Slack token", "Configured".to_string()));

            match api.auth_test().await {
                Ok(auth) => {
                    checks.push(("Slack auth", "OK".to_string()));
                    checks.push(("Bot user", format!("{} ({})", auth.user, auth.user_id)));
                    if !auth.team.is_empty() {
                        checks.push(("Workspace", auth.team));
                    }
                }
                Err(e) => {
                    checks.push(("Slack auth", "Failed".to_string()));
                    issues.push(format!("Slack rejected the token: {}", e));
                }
            }
        }
        Err(e) => {
            checks.push(("Slack token", "Missing".to_string()));
            issues.push(e.to_string());
        }
    }

    match format {
        OutputFormat::Text => {
            println!("Huddle Diagnostics");
            println!("==================");
            println!();

            println!("Checks:");
            for (check, status) in &checks {
                println!("  {:<25} {}", format!("{}:", check), status);
            }

            println!();

            if issues.is_empty() {
                println!("✓ All checks passed!");
            } else {
                println!("⚠ Issues found:");
                println!();
                for (i, issue) in issues.iter().enumerate() {
                    println!("  {}. {}", i + 1, issue);
                }
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "checks": checks.iter().map(|(name, status)| {
                    json!({
                        "name": name,
                        "status": status
                    })
                }).collect::<Vec<_>>(),
                "issues": issues,
                "healthy": issues.is_empty()
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
