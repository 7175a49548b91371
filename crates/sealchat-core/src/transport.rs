//! Messaging transport abstraction.
//!
//! The transport appends sealed messages to the server's per-chat log,
//! pushes new messages to subscribers, and serves cursor-paginated history
//! (newest-first). Delivery acknowledgment and socket-level retries are out
//! of scope: the engine treats a send failure as retryable by constructing a
//! new outbound record, never by reusing a counter.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::types::{ChatId, ChatMessage, OutboundEnvelope};

/// Capacity of each subscriber's push channel.
const SUBSCRIBER_CHANNEL_CAPACITY: usize = 64;

/// Errors from the messaging transport.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Joining a channel failed.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Appending an outbound message failed.
    #[error("send failed: {0}")]
    Send(String),

    /// A history page could not be fetched.
    #[error("history fetch failed: {0}")]
    History(String),
}

/// Opaque position in a chat's history, assigned by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryCursor(pub u64);

/// One page of history, newest-first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryPage {
    /// Messages in this page, newest first.
    pub messages: Vec<ChatMessage>,
    /// Whether older messages remain.
    pub has_more: bool,
    /// Cursor for the next (older) page. `None` when exhausted.
    pub next_cursor: Option<HistoryCursor>,
}

/// Message transport seam.
#[async_trait]
pub trait MessageTransport: Send + Sync + 'static {
    /// Append an outbound message to the chat log and fan it out to
    /// subscribers.
    async fn send(&self, envelope: OutboundEnvelope) -> Result<(), TransportError>;

    /// Join a per-conversation channel; pushed messages arrive on the
    /// returned receiver in arrival order. Dropping the receiver leaves the
    /// channel.
    async fn subscribe(
        &self,
        chat_id: ChatId,
    ) -> Result<mpsc::Receiver<ChatMessage>, TransportError>;

    /// Fetch one page of history, newest-first. `cursor` of `None` starts
    /// from the newest message.
    async fn fetch_history(
        &self,
        chat_id: ChatId,
        cursor: Option<HistoryCursor>,
        limit: usize,
    ) -> Result<HistoryPage, TransportError>;
}

/// In-memory transport for tests and simulation.
///
/// Keeps an append-only log per chat and fans out sends to live
/// subscribers. Clones share state through an `Arc`, so one instance can
/// serve both simulated devices in a conversation.
///
/// # Panics
///
/// Panics if the internal mutex is poisoned (a thread panicked while holding
/// the lock). This is acceptable for test/simulation code.
#[derive(Clone, Default)]
pub struct MemoryTransport {
    inner: Arc<Mutex<TransportState>>,
}

#[derive(Default)]
struct TransportState {
    /// Append-only message log per chat, oldest first.
    logs: HashMap<ChatId, Vec<ChatMessage>>,
    /// Live push channels per chat.
    subscribers: HashMap<ChatId, Vec<mpsc::Sender<ChatMessage>>>,
    /// Logical clock for server-assigned timestamps.
    clock_ms: u64,
}

impl MemoryTransport {
    /// Create an empty transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pre-built message directly, bypassing the send path.
    ///
    /// Test hook for injecting corrupt, foreign-sender, or historical
    /// messages into a chat log.
    #[allow(clippy::expect_used)]
    pub fn append_raw(&self, message: ChatMessage) {
        let mut state = self.inner.lock().expect("Mutex poisoned");
        let chat_id = message.chat_id;
        state.logs.entry(chat_id).or_default().push(message.clone());
        Self::fan_out(&mut state, chat_id, &message);
    }

    /// Number of messages stored for a chat.
    #[allow(clippy::expect_used)]
    pub fn message_count(&self, chat_id: ChatId) -> usize {
        self.inner
            .lock()
            .expect("Mutex poisoned")
            .logs
            .get(&chat_id)
            .map_or(0, Vec::len)
    }

    /// Push to live subscribers, discarding closed channels.
    fn fan_out(state: &mut TransportState, chat_id: ChatId, message: &ChatMessage) {
        if let Some(senders) = state.subscribers.get_mut(&chat_id) {
            senders.retain(|sender| sender.try_send(message.clone()).is_ok());
        }
    }
}

#[async_trait]
impl MessageTransport for MemoryTransport {
    #[allow(clippy::expect_used)]
    async fn send(&self, envelope: OutboundEnvelope) -> Result<(), TransportError> {
        let mut state = self.inner.lock().expect("Mutex poisoned");
        state.clock_ms += 1;
        let message = ChatMessage {
            chat_id: envelope.chat_id,
            sender_id: envelope.sender_id,
            encrypted_content: envelope.encrypted_content,
            nonce: envelope.nonce,
            message_counter: envelope.message_counter,
            timestamp_ms: state.clock_ms,
        };
        state.logs.entry(message.chat_id).or_default().push(message.clone());
        Self::fan_out(&mut state, message.chat_id, &message);
        Ok(())
    }

    #[allow(clippy::expect_used)]
    async fn subscribe(
        &self,
        chat_id: ChatId,
    ) -> Result<mpsc::Receiver<ChatMessage>, TransportError> {
        let (sender, receiver) = mpsc::channel(SUBSCRIBER_CHANNEL_CAPACITY);
        self.inner
            .lock()
            .expect("Mutex poisoned")
            .subscribers
            .entry(chat_id)
            .or_default()
            .push(sender);
        Ok(receiver)
    }

    #[allow(clippy::expect_used)]
    async fn fetch_history(
        &self,
        chat_id: ChatId,
        cursor: Option<HistoryCursor>,
        limit: usize,
    ) -> Result<HistoryPage, TransportError> {
        let state = self.inner.lock().expect("Mutex poisoned");
        let log = state.logs.get(&chat_id).map_or(&[][..], Vec::as_slice);

        // The cursor is the log index below which messages are older than
        // everything already served.
        let end = cursor.map_or(log.len(), |c| (c.0 as usize).min(log.len()));
        let start = end.saturating_sub(limit);

        let mut messages: Vec<ChatMessage> = log[start..end].to_vec();
        messages.reverse(); // newest first

        Ok(HistoryPage {
            messages,
            has_more: start > 0,
            next_cursor: (start > 0).then_some(HistoryCursor(start as u64)),
        })
    }
}
