//! RTM transport: handshake, receive and sequenced send over a WebSocket.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};

use crate::error::BotError;
use crate::slack::message::Message;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// The chat connection every handler talks through.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Wait for the next inbound message.
    async fn receive(&self) -> Result<Message, BotError>;

    /// Stamp the next sequence id on `message`, write it, and return the id.
    async fn send(&self, message: Message) -> Result<u64, BotError>;
}

/// Process-wide allocator of outbound message ids.
///
/// Ids start at 1 and grow by exactly one per call. An id handed out for a
/// send that later fails is not reused.
#[derive(Debug, Default)]
pub struct Sequencer {
    last: AtomicU64,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> u64 {
        self.last.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Last id handed out, 0 if none.
    pub fn last(&self) -> u64 {
        self.last.load(Ordering::SeqCst)
    }
}

/// Result of a successful `rtm.connect` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// WebSocket URL to dial.
    pub url: String,
    /// The bot's own user id.
    pub self_id: String,
}

#[derive(Debug, Deserialize)]
struct HandshakeResponse {
    ok: bool,
    #[serde(default)]
    error: String,
    #[serde(default)]
    url: String,
    #[serde(rename = "self", default)]
    identity: Identity,
}

#[derive(Debug, Default, Deserialize)]
struct Identity {
    #[serde(default)]
    id: String,
}

/// Call `rtm.connect` with `token` and return the socket endpoint.
pub async fn handshake(
    http: &reqwest::Client,
    api_base: &str,
    token: &str,
) -> Result<Endpoint, BotError> {
    let url = format!("{}/rtm.connect", api_base.trim_end_matches('/'));
    debug!(%url, "Starting RTM handshake");

    let response: HandshakeResponse = http
        .get(&url)
        .query(&[("token", token)])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    if !response.ok {
        let reason = if response.error.is_empty() {
            "unknown error".to_string()
        } else {
            response.error
        };
        return Err(BotError::Handshake(reason));
    }
    if response.url.is_empty() {
        return Err(BotError::Handshake("response is missing the socket url".into()));
    }
    if response.identity.id.is_empty() {
        return Err(BotError::Handshake("response is missing the bot id".into()));
    }

    Ok(Endpoint {
        url: response.url,
        self_id: response.identity.id,
    })
}

/// Handshake with Slack and open the RTM socket.
///
/// Returns the transport and the bot's own user id.
pub async fn connect(api_base: &str, token: &str) -> Result<(SlackTransport, String), BotError> {
    let http = reqwest::Client::new();
    let endpoint = handshake(&http, api_base, token).await?;
    info!(self_id = %endpoint.self_id, "Handshake accepted");
    let transport = SlackTransport::open(&endpoint.url).await?;
    Ok((transport, endpoint.self_id))
}

/// WebSocket connection to Slack's RTM API.
pub struct SlackTransport {
    reader: Mutex<SplitStream<WsStream>>,
    writer: Mutex<SplitSink<WsStream, WsMessage>>,
    sequence: Sequencer,
}

impl SlackTransport {
    /// Dial the socket at `url`.
    pub async fn open(url: &str) -> Result<Self, BotError> {
        let (stream, _response) = connect_async(url)
            .await
            .map_err(|e| BotError::WebSocket(format!("connect to {url} failed: {e}")))?;
        info!("🔌 WebSocket connected");

        let (writer, reader) = stream.split();
        Ok(Self {
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
            sequence: Sequencer::new(),
        })
    }

    /// Last outbound id handed out.
    pub fn last_id(&self) -> u64 {
        self.sequence.last()
    }
}

#[async_trait]
impl Transport for SlackTransport {
    async fn receive(&self) -> Result<Message, BotError> {
        let mut reader = self.reader.lock().await;
        loop {
            let Some(frame) = reader.next().await else {
                info!("WebSocket stream ended");
                return Err(BotError::ConnectionClosed);
            };

            match frame? {
                WsMessage::Text(text) => {
                    let message: Message = serde_json::from_str(&text)?;
                    debug!(kind = %message.kind, channel = %message.channel, "Received message");
                    return Ok(message);
                }
                WsMessage::Close(frame) => {
                    info!(?frame, "Received close frame");
                    return Err(BotError::ConnectionClosed);
                }
                // Ping, Pong, Binary, raw frames
                _ => {}
            }
        }
    }

    async fn send(&self, mut message: Message) -> Result<u64, BotError> {
        // Allocate under the writer lock so ids hit the wire in order.
        let mut writer = self.writer.lock().await;
        message.id = self.sequence.next();
        let payload = serde_json::to_string(&message)?;
        writer.send(WsMessage::Text(payload)).await?;
        debug!(id = message.id, channel = %message.channel, "Sent message");
        Ok(message.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_sequencer_starts_at_one() {
        let seq = Sequencer::new();
        assert_eq!(seq.last(), 0);
        assert_eq!(seq.next(), 1);
        assert_eq!(seq.next(), 2);
        assert_eq!(seq.last(), 2);
    }

    #[test]
    fn test_sequencer_is_unique_across_threads() {
        let seq = Arc::new(Sequencer::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let seq = seq.clone();
                std::thread::spawn(move || (0..500).map(|_| seq.next()).collect::<Vec<_>>())
            })
            .collect();

        let mut ids: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, (1..=4000).collect::<Vec<u64>>());
    }

    #[test]
    fn test_ids_increase_within_each_thread() {
        let seq = Arc::new(Sequencer::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let seq = seq.clone();
                std::thread::spawn(move || (0..200).map(|_| seq.next()).collect::<Vec<_>>())
            })
            .collect();

        for handle in handles {
            let ids = handle.join().unwrap();
            assert!(ids.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_handshake_response_without_optional_fields() {
        let resp: HandshakeResponse =
            serde_json::from_str(r#"{"ok":false,"error":"invalid_auth"}"#).unwrap();
        assert!(!resp.ok);
        assert_eq!(resp.error, "invalid_auth");
        assert!(resp.url.is_empty());
        assert!(resp.identity.id.is_empty());
    }

    #[test]
    fn test_handshake_response_reads_self_id() {
        let resp: HandshakeResponse = serde_json::from_str(
            r#"{"ok":true,"url":"wss://example.test/ws","self":{"id":"U0ADC97QS","name":"mario"}}"#,
        )
        .unwrap();
        assert!(resp.ok);
        assert_eq!(resp.url, "wss://example.test/ws");
        assert_eq!(resp.identity.id, "U0ADC97QS");
    }
}
