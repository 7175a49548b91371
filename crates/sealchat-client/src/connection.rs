//! Scoped connection handle for pushed messages.
//!
//! A [`Connection`] is owned by the view that created it and passed by
//! reference to whatever consumes pushed messages. There is no global
//! connection state: dropping the handle (or calling
//! [`disconnect`](Connection::disconnect)) tears the subscription down, so a
//! view exit can never leak a live channel.

use sealchat_core::{ChatId, ChatMessage};
use tokio::sync::mpsc;

/// A live subscription to one conversation's pushed messages.
#[derive(Debug)]
pub struct Connection {
    chat_id: ChatId,
    receiver: Option<mpsc::Receiver<ChatMessage>>,
}

impl Connection {
    pub(crate) fn new(chat_id: ChatId, receiver: mpsc::Receiver<ChatMessage>) -> Self {
        Self { chat_id, receiver: Some(receiver) }
    }

    /// The conversation this connection is joined to.
    pub fn chat_id(&self) -> ChatId {
        self.chat_id
    }

    /// Whether the subscription is still live.
    pub fn is_connected(&self) -> bool {
        self.receiver.is_some()
    }

    /// Wait for the next pushed message.
    ///
    /// Returns `None` once disconnected, either locally via
    /// [`disconnect`](Connection::disconnect) or because the transport
    /// closed the channel.
    pub async fn next_message(&mut self) -> Option<ChatMessage> {
        match self.receiver.as_mut() {
            Some(receiver) => {
                let message = receiver.recv().await;
                if message.is_none() {
                    // Transport side closed; release the channel.
                    self.receiver = None;
                }
                message
            },
            None => None,
        }
    }

    /// Leave the conversation channel. Idempotent.
    pub fn disconnect(&mut self) {
        if self.receiver.take().is_some() {
            tracing::debug!(chat_id = %self.chat_id, "disconnected from chat channel");
        }
    }
}
