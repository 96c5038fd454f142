//! In-memory transport for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::BotError;
use crate::slack::{Message, Sequencer, Transport};

/// Replays queued inbound messages and records everything sent.
///
/// Once the inbound queue is empty, `receive` reports a closed connection.
#[derive(Default)]
pub struct RecordingTransport {
    inbound: Mutex<VecDeque<Message>>,
    sent: Mutex<Vec<Message>>,
    sequence: Sequencer,
    fail_sends: bool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport whose sends all fail (ids are still consumed).
    pub fn failing() -> Self {
        Self {
            fail_sends: true,
            ..Self::default()
        }
    }

    pub fn with_inbound(self, messages: impl IntoIterator<Item = Message>) -> Self {
        self.inbound.lock().unwrap().extend(messages);
        self
    }

    pub fn sent(&self) -> Vec<Message> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|m| m.text).collect()
    }

    pub fn last_id(&self) -> u64 {
        self.sequence.last()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn receive(&self) -> Result<Message, BotError> {
        self.inbound
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(BotError::ConnectionClosed)
    }

    async fn send(&self, mut message: Message) -> Result<u64, BotError> {
        message.id = self.sequence.next();
        if self.fail_sends {
            return Err(BotError::WebSocket("broken pipe".into()));
        }
        let id = message.id;
        self.sent.lock().unwrap().push(message);
        Ok(id)
    }
}

/// An inbound chat message in channel `C1`.
pub fn inbound(text: &str) -> Message {
    Message {
        id: 0,
        kind: "message".into(),
        channel: "C1".into(),
        text: text.into(),
    }
}
