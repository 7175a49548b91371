//! The client engine.
//!
//! One [`ChatEngine`] per device and authenticated user. Lifecycle
//! operations (register, unlock, lock) take `&mut self`; they are a single
//! flow. Messaging operations take `&self` and serialize per-chat through an
//! async mutex, so the read-counter / increment / seal step can never
//! interleave between two sends on the same session.

use std::collections::HashMap;

use rand::rngs::OsRng;
use sealchat_core::{
    ChatId, ChatMessage, ChatSession, DecryptFailure, DecryptOutcome, DecryptedMessage,
    EngineConfig, EngineError, HistoryCursor, KeyDirectory, KeyState, Keyring, MessageTransport,
    OutboundEnvelope, SecureStore, UserId, reconcile_page,
};
use tokio::sync::Mutex;

use crate::connection::Connection;

/// One reconciled page of history, ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryBatch {
    /// Decrypted messages, newest first.
    pub messages: Vec<DecryptedMessage>,
    /// Messages skipped in this page (foreign sender or failed
    /// authentication).
    pub dropped: usize,
    /// Cursor for the next (older) page. `None` when exhausted.
    pub next_cursor: Option<HistoryCursor>,
    /// Whether older messages remain.
    pub has_more: bool,
}

/// The messaging engine for one device.
pub struct ChatEngine<D, S, T> {
    keyring: Keyring<D, S>,
    directory: D,
    transport: T,
    config: EngineConfig,
    sessions: Mutex<HashMap<ChatId, ChatSession>>,
}

impl<D, S, T> ChatEngine<D, S, T>
where
    D: KeyDirectory + Clone,
    S: SecureStore,
    T: MessageTransport,
{
    /// Create an engine for the currently authenticated user.
    pub fn new(directory: D, store: S, transport: T, user_id: UserId) -> Self {
        Self::with_config(directory, store, transport, user_id, EngineConfig::default())
    }

    /// Create an engine with explicit configuration.
    pub fn with_config(
        directory: D,
        store: S,
        transport: T,
        user_id: UserId,
        config: EngineConfig,
    ) -> Self {
        let keyring = Keyring::new(directory.clone(), store, user_id, config.kdf);
        Self { keyring, directory, transport, config, sessions: Mutex::new(HashMap::new()) }
    }

    /// Current key lifecycle state.
    pub async fn key_state(&self) -> Result<KeyState, EngineError> {
        self.keyring.state().await
    }

    /// Whether the identity is unlocked.
    pub fn is_unlocked(&self) -> bool {
        self.keyring.is_unlocked()
    }

    /// Register a new messaging identity sealed under `password`.
    pub async fn register(&mut self, password: &[u8]) -> Result<(), EngineError> {
        self.keyring.register(password, &mut OsRng).await
    }

    /// Unlock the identity with `password`, recovering it from the
    /// directory record if this device has no local key material.
    pub async fn unlock(&mut self, password: &[u8]) -> Result<(), EngineError> {
        self.keyring.unlock(password).await
    }

    /// Unlock without a password from local secure storage. Returns `false`
    /// (after wiping any foreign-bound material) when the caller must fall
    /// back to [`unlock`](Self::unlock) or [`register`](Self::register).
    pub fn auto_unlock(&mut self) -> Result<bool, EngineError> {
        self.keyring.auto_unlock()
    }

    /// Lock the identity and drop every in-memory session key. Local key
    /// material persists, so the same user auto-unlocks next launch.
    pub fn lock(&mut self) {
        self.keyring.lock();
        self.sessions.get_mut().clear();
    }

    /// Logout: lock, and remove local key material.
    pub fn logout(&mut self) -> Result<(), EngineError> {
        self.sessions.get_mut().clear();
        self.keyring.clear_local()
    }

    /// Establish (or reuse) the session for a conversation with `peer`.
    ///
    /// Fetches the peer's public key from the directory and derives the
    /// shared key locally. An existing session is kept, since its send counter
    /// must survive re-opening the conversation view.
    ///
    /// # Errors
    ///
    /// [`EngineError::NoKeyMaterial`] when the peer has not registered a
    /// key. The caller must not fall back to plaintext.
    pub async fn open_chat(
        &self,
        chat_id: ChatId,
        peer: UserId,
    ) -> Result<(), EngineError> {
        let material = self.keyring.key_material()?.clone();
        let Some(peer_public) = self.directory.fetch_public_key(peer).await? else {
            return Err(EngineError::NoKeyMaterial { user_id: peer });
        };

        let mut sessions = self.sessions.lock().await;
        if !sessions.contains_key(&chat_id) {
            let session = ChatSession::establish(chat_id, &material, peer, &peer_public)?;
            sessions.insert(chat_id, session);
        }
        Ok(())
    }

    /// Seal and send a message on an established chat.
    ///
    /// The send counter advances when sealing succeeds, before the
    /// transport send. A transport failure therefore leaves a gap in the
    /// counter sequence (safe for nonce uniqueness), and a retry must go
    /// through this method again to get a fresh counter, never re-send the
    /// failed envelope.
    pub async fn send(
        &self,
        chat_id: ChatId,
        plaintext: &[u8],
    ) -> Result<OutboundEnvelope, EngineError> {
        let envelope = {
            let mut sessions = self.sessions.lock().await;
            let session = sessions
                .get_mut(&chat_id)
                .ok_or(EngineError::SessionNotEstablished { chat_id })?;
            session.seal_next(plaintext, &mut OsRng)
        };

        self.transport.send(envelope.clone()).await?;
        Ok(envelope)
    }

    /// Decrypt one realtime-pushed message.
    ///
    /// Messages for chats without a session, from non-participants, or that
    /// fail authentication are skipped: logged and dropped, never queued
    /// and never fatal to the stream.
    pub async fn receive(&self, message: &ChatMessage) -> Option<DecryptedMessage> {
        let sessions = self.sessions.lock().await;
        let Some(session) = sessions.get(&message.chat_id) else {
            tracing::debug!(chat_id = %message.chat_id, "pushed message for chat without session");
            return None;
        };

        match session.open_from(message.sender_id, &message.encrypted_content, &message.nonce) {
            DecryptOutcome::Decrypted(plaintext) => Some(DecryptedMessage {
                chat_id: message.chat_id,
                sender_id: message.sender_id,
                plaintext,
                message_counter: message.message_counter,
                timestamp_ms: message.timestamp_ms,
            }),
            DecryptOutcome::Failed(reason @ DecryptFailure::ForeignSender { .. }) => {
                tracing::debug!(
                    chat_id = %message.chat_id,
                    ?reason,
                    "skipping pushed message from non-participant"
                );
                None
            },
            DecryptOutcome::Failed(reason) => {
                tracing::warn!(
                    chat_id = %message.chat_id,
                    sender_id = %message.sender_id,
                    ?reason,
                    "dropping undecryptable pushed message"
                );
                None
            },
        }
    }

    /// Fetch and reconcile one page of history, newest-first.
    ///
    /// The network fetch happens before any session state is touched:
    /// cancelling an in-flight fetch mutates nothing, and the counter
    /// reseed applies all-or-nothing once the full page has been scanned.
    pub async fn load_history_page(
        &self,
        chat_id: ChatId,
        cursor: Option<HistoryCursor>,
    ) -> Result<HistoryBatch, EngineError> {
        let page = self
            .transport
            .fetch_history(chat_id, cursor, self.config.history_page_size)
            .await?;

        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .get_mut(&chat_id)
            .ok_or(EngineError::SessionNotEstablished { chat_id })?;
        let outcome = reconcile_page(session, &page.messages);

        Ok(HistoryBatch {
            messages: outcome.decrypted,
            dropped: outcome.dropped,
            next_cursor: page.next_cursor,
            has_more: page.has_more,
        })
    }

    /// Join the conversation's push channel.
    ///
    /// The returned [`Connection`] is a scoped handle: dropping it (or
    /// calling its `disconnect`) leaves the channel.
    pub async fn connect(&self, chat_id: ChatId) -> Result<Connection, EngineError> {
        let receiver = self.transport.subscribe(chat_id).await?;
        Ok(Connection::new(chat_id, receiver))
    }

    /// The next send counter for an established chat, if any. Test and
    /// diagnostics hook.
    pub async fn next_send_counter(&self, chat_id: ChatId) -> Option<u64> {
        self.sessions.lock().await.get(&chat_id).map(ChatSession::next_send_counter)
    }
}
