//! Slack RTM websocket transport
//!
//! Each `connect` asks the Web API for a fresh RTM URL and opens a websocket
//! to it. Reads wait briefly for the first frame, then drain whatever else is
//! already buffered, so an idle connection yields empty batches and the
//! resilience loop gets to keep alive and sleep.

use std::io::ErrorKind;
use std::time::Duration;

use async_trait::async_trait;
use futures::{FutureExt, SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use sdk::errors::TransportError;
use sdk::transport::{ChatTransport, Result};
use sdk::types::{BotIdentity, EventKind, InboundEvent};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use super::slack_api::SlackWebApi;
use crate::daemon::now_unix;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How long a read waits for the first frame before returning an empty batch
const FIRST_FRAME_WAIT: Duration = Duration::from_millis(250);

/// Slack RTM connection
pub struct SlackRtm {
    api: SlackWebApi,
    socket: Option<Socket>,
    next_id: u64,
}

/// The fields of an RTM frame the bot looks at
#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    kind: Option<String>,
    subtype: Option<String>,
    channel: Option<String>,
    user: Option<String>,
    text: Option<String>,
    ts: Option<String>,
}

impl SlackRtm {
    pub fn new(api: SlackWebApi) -> Self {
        Self {
            api,
            socket: None,
            next_id: 0,
        }
    }

    fn frame_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    async fn send_frame(&mut self, frame: serde_json::Value) -> Result<()> {
        let socket = self.socket.as_mut().ok_or(TransportError::NotConnected)?;
        let result = socket.send(WsMessage::Text(frame.to_string())).await;
        result.map_err(|e| self.fail(e))
    }

    /// Map a websocket error, dropping the socket when it is unusable
    fn fail(&mut self, err: WsError) -> TransportError {
        let mapped = map_ws_error(err);
        if matches!(
            mapped,
            TransportError::Closed(_) | TransportError::ConnectionReset(_)
        ) {
            self.socket = None;
        }
        mapped
    }
}

#[async_trait]
impl ChatTransport for SlackRtm {
    async fn connect(&mut self) -> Result<BotIdentity> {
        self.socket = None;
        let session = self.api.rtm_connect().await?;
        let (socket, _response) = tokio_tungstenite::connect_async(session.url.as_str())
            .await
            .map_err(map_ws_error)?;

        info!("RTM websocket open");
        self.socket = Some(socket);
        self.next_id = 0;
        Ok(BotIdentity::from(session))
    }

    fn is_connected(&self) -> bool {
        self.socket.is_some()
    }

    async fn ping(&mut self) -> Result<()> {
        let id = self.frame_id();
        self.send_frame(json!({ "id": id, "type": "ping" })).await
    }

    async fn read(&mut self) -> Result<Vec<InboundEvent>> {
        let socket = self.socket.as_mut().ok_or(TransportError::NotConnected)?;

        let mut frames = Vec::new();
        match tokio::time::timeout(FIRST_FRAME_WAIT, socket.next()).await {
            Err(_elapsed) => return Ok(Vec::new()),
            Ok(frame) => frames.push(frame),
        }
        while let Some(frame) = socket.next().now_or_never() {
            let end = frame.is_none();
            frames.push(frame);
            if end {
                break;
            }
        }

        let mut events = Vec::new();
        for frame in frames {
            match frame {
                Some(Ok(WsMessage::Text(text))) => {
                    if let Some(event) = parse_event(&text) {
                        events.push(event);
                    }
                }
                Some(Ok(WsMessage::Close(_))) | None => {
                    info!("RTM connection closed by server");
                    self.socket = None;
                    if events.is_empty() {
                        return Err(TransportError::Closed("closed by server".to_string()));
                    }
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    let err = self.fail(err);
                    if events.is_empty() {
                        return Err(err);
                    }
                    warn!(error = %err, "read failed after partial batch");
                    break;
                }
            }
        }
        Ok(events)
    }

    async fn send(&mut self, destination: &str, text: &str) -> Result<()> {
        let id = self.frame_id();
        self.send_frame(json!({
            "id": id,
            "type": "message",
            "channel": destination,
            "text": text,
        }))
        .await
    }

    fn disconnect(&mut self) {
        if self.socket.take().is_some() {
            debug!("RTM websocket dropped");
        }
    }
}

/// Turn one RTM text frame into an event
///
/// Malformed frames, replies to our own sends, and message subtypes (edits,
/// joins, bot posts) yield `None`.
fn parse_event(text: &str) -> Option<InboundEvent> {
    let raw: RawEvent = match serde_json::from_str(text) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, "skipping malformed RTM frame");
            return None;
        }
    };

    let kind = raw.kind?;
    match kind.as_str() {
        "pong" => Some(InboundEvent::pong(now_unix())),
        "message" => {
            if raw.subtype.is_some() {
                return None;
            }
            let timestamp = raw.ts.as_deref().and_then(|ts| ts.parse::<f64>().ok())?;
            Some(InboundEvent::message(
                raw.channel?,
                raw.user?,
                raw.text.unwrap_or_default(),
                timestamp,
            ))
        }
        _ => Some(InboundEvent {
            kind: EventKind::Other(kind),
            destination: raw.channel.unwrap_or_default(),
            author: raw.user.unwrap_or_default(),
            text: String::new(),
            timestamp: now_unix(),
        }),
    }
}

fn map_ws_error(err: WsError) -> TransportError {
    match err {
        WsError::ConnectionClosed | WsError::AlreadyClosed => {
            TransportError::Closed(err.to_string())
        }
        WsError::Protocol(ProtocolError::ResetWithoutClosingHandshake) => {
            TransportError::ConnectionReset(err.to_string())
        }
        WsError::Io(ref io) if io.kind() == ErrorKind::TimedOut => {
            TransportError::Timeout(err.to_string())
        }
        WsError::Io(_) => TransportError::ConnectionReset(err.to_string()),
        other => TransportError::Decode(other.to_string()),
    }
}
