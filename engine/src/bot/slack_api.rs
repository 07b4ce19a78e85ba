//! Slack Web API client
//!
//! Covers the handful of methods the bot needs: starting an RTM session,
//! checking the token, and the identity lookups behind `Directory`. Every
//! call is a form POST with the bot token as bearer auth. Slack reports
//! failures in the body as `{"ok": false, "error": "..."}`, which maps to
//! `TransportError::Api`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use sdk::errors::{EngineError, TransportError};
use sdk::transport::{Directory, Result};
use sdk::types::{BotIdentity, ChannelInfo, UserInfo};
use tracing::debug;

use crate::config::{Config, TOKEN_ENV_VAR};

/// Page size requested from `conversations.members`
const MEMBERS_PAGE_LIMIT: &str = "200";

/// Slack Web API client bound to one bot token
#[derive(Clone)]
pub struct SlackWebApi {
    token: String,
    api_base: String,
    client: Client,
}

impl std::fmt::Debug for SlackWebApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackWebApi")
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Result of `rtm.connect`
#[derive(Debug, Clone, Deserialize)]
pub struct RtmSession {
    pub url: String,
    #[serde(rename = "self")]
    pub bot: RtmSelf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RtmSelf {
    pub id: String,
    pub name: String,
}

/// Result of `auth.test`
#[derive(Debug, Clone, Deserialize)]
pub struct AuthInfo {
    pub user_id: String,
    pub user: String,
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Deserialize)]
struct Envelope {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct ConversationInfo {
    channel: ConversationChannel,
}

#[derive(Deserialize)]
struct ConversationChannel {
    id: String,
    #[serde(default)]
    name: String,
}

#[derive(Deserialize)]
struct MembersPage {
    members: Vec<String>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: String,
}

#[derive(Deserialize)]
struct UserResponse {
    user: SlackUser,
}

#[derive(Deserialize)]
struct SlackUser {
    id: String,
    name: String,
    #[serde(default)]
    is_bot: bool,
}

impl SlackWebApi {
    pub fn new(token: impl Into<String>, api_base: impl Into<String>, timeout: Duration) -> Self {
        Self {
            token: token.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }

    /// Build a client from configuration, failing when no token is set
    pub fn from_config(config: &Config) -> std::result::Result<Self, EngineError> {
        let token = config.token().ok_or_else(|| {
            EngineError::Config(format!(
                "No Slack token: set slack.token or {}",
                TOKEN_ENV_VAR
            ))
        })?;
        Ok(Self::new(
            token,
            config.slack.api_base.clone(),
            Duration::from_secs(config.slack.request_timeout_secs),
        ))
    }

    /// Start an RTM session, returning the websocket URL and bot identity
    pub async fn rtm_connect(&self) -> Result<RtmSession> {
        self.call("rtm.connect", &[]).await
    }

    /// Check the token and report who it belongs to
    pub async fn auth_test(&self) -> Result<AuthInfo> {
        self.call("auth.test", &[]).await
    }

    async fn call<R: DeserializeOwned>(&self, method: &str, params: &[(&str, &str)]) -> Result<R> {
        let url = format!("{}/{}", self.api_base, method);
        debug!(method = method, "slack api call");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .form(params)
            .send()
            .await
            .map_err(|e| map_request_error(method, e))?;

        let status = response.status();
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| TransportError::Decode(format!("{}: {}", method, e)))?;

        let envelope: Envelope = serde_json::from_value(body.clone())
            .map_err(|_| TransportError::api(method, format!("http_{}", status.as_u16())))?;
        if !envelope.ok {
            return Err(TransportError::api(
                method,
                envelope.error.unwrap_or_else(|| "unknown_error".to_string()),
            ));
        }

        serde_json::from_value(body).map_err(|e| TransportError::Decode(format!("{}: {}", method, e)))
    }

    async fn channel_members(&self, channel_id: &str) -> Result<Vec<String>> {
        let mut members = Vec::new();
        let mut cursor = String::new();

        loop {
            let page: MembersPage = {
                let mut params = vec![("channel", channel_id), ("limit", MEMBERS_PAGE_LIMIT)];
                if !cursor.is_empty() {
                    params.push(("cursor", cursor.as_str()));
                }
                self.call("conversations.members", &params).await?
            };
            members.extend(page.members);

            cursor = page
                .response_metadata
                .map(|meta| meta.next_cursor)
                .unwrap_or_default();
            if cursor.is_empty() {
                return Ok(members);
            }
        }
    }
}

impl From<RtmSession> for BotIdentity {
    fn from(session: RtmSession) -> Self {
        BotIdentity {
            id: session.bot.id,
            name: session.bot.name,
        }
    }
}

#[async_trait]
impl Directory for SlackWebApi {
    async fn resolve_channel(&self, channel_id: &str) -> Result<ChannelInfo> {
        let info: ConversationInfo = self
            .call("conversations.info", &[("channel", channel_id)])
            .await?;
        let members = self.channel_members(channel_id).await?;

        Ok(ChannelInfo {
            id: info.channel.id,
            name: info.channel.name,
            members,
        })
    }

    async fn resolve_user(&self, user_id: &str) -> Result<UserInfo> {
        let response: UserResponse = self.call("users.info", &[("user", user_id)]).await?;
        Ok(UserInfo {
            id: response.user.id,
            name: response.user.name,
            is_bot: response.user.is_bot,
        })
    }

    async fn open_direct(&self, user_id: &str) -> Result<String> {
        let response: ConversationInfo = self
            .call("conversations.open", &[("users", user_id)])
            .await?;
        Ok(response.channel.id)
    }
}

fn map_request_error(method: &str, err: reqwest::Error) -> TransportError {
    let detail = format!("{}: {}", method, err);
    if err.is_timeout() {
        TransportError::Timeout(detail)
    } else if err.is_connect() || err.is_request() {
        TransportError::ConnectionReset(detail)
    } else {
        TransportError::Decode(detail)
    }
}
