//! Chat session: shared key plus send counter discipline.
//!
//! A session exists only in memory. The shared key is recomputed from local
//! key material and the peer's public key whenever needed, and the whole
//! session is dropped on lock, logout, or disconnect.
//!
//! # Invariants
//!
//! - `next_send_counter` only moves forward
//! - Advancing the counter and sealing happen as one step behind `&mut self`
//! - A counter value is never reused, even across retries: a failed send
//!   leaves a gap in the sequence, never a duplicate nonce

use rand::{CryptoRng, RngCore};
use sealchat_crypto::{
    NONCE_RANDOM_SIZE, NONCE_SIZE, PublicKey, SymmetricKey, derive_shared_key, open_message,
    seal_message,
};

use crate::{
    error::EngineError,
    types::{ChatId, LocalKeyMaterial, OutboundEnvelope, UserId},
};

/// Why a message failed to decrypt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecryptFailure {
    /// Authentication failed: wrong key, tampered payload, or a stale
    /// session. Not distinguished further.
    Authentication,
    /// The sender is not a participant of this session.
    ForeignSender {
        /// The unexpected sender.
        sender_id: UserId,
    },
}

/// Result of decrypting one message.
///
/// Both the realtime and history paths consume this uniformly: a `Failed`
/// message is droppable, never fatal to the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecryptOutcome {
    /// The plaintext message body.
    Decrypted(Vec<u8>),
    /// The message could not be decrypted and should be skipped.
    Failed(DecryptFailure),
}

/// An established conversation with one counterpart.
///
/// The shared key is never persisted or logged (`SymmetricKey` zeroizes on
/// drop and redacts `Debug`).
#[derive(Debug)]
pub struct ChatSession {
    chat_id: ChatId,
    local_user: UserId,
    peer_user: UserId,
    shared_key: SymmetricKey,
    next_send_counter: u64,
}

impl ChatSession {
    /// Establish a session from local key material and the peer's public
    /// key.
    ///
    /// Pure computation, no network. Fails closed if the peer key is
    /// unusable; the caller must not fall back to plaintext.
    pub fn establish(
        chat_id: ChatId,
        material: &LocalKeyMaterial,
        peer_user: UserId,
        peer_public: &PublicKey,
    ) -> Result<Self, EngineError> {
        let shared_key = derive_shared_key(peer_public, &material.secret_key)?;
        Ok(Self {
            chat_id,
            local_user: material.bound_user_id,
            peer_user,
            shared_key,
            next_send_counter: 0,
        })
    }

    /// Conversation this session encrypts for.
    pub fn chat_id(&self) -> ChatId {
        self.chat_id
    }

    /// The local participant.
    pub fn local_user(&self) -> UserId {
        self.local_user
    }

    /// The counterpart.
    pub fn peer_user(&self) -> UserId {
        self.peer_user
    }

    /// Whether `user` is one of the two participants.
    pub fn is_participant(&self, user: UserId) -> bool {
        user == self.local_user || user == self.peer_user
    }

    /// The counter the next outbound message will use.
    pub fn next_send_counter(&self) -> u64 {
        self.next_send_counter
    }

    /// Seal an outbound message with the next send counter.
    ///
    /// The counter advances only after sealing succeeds, as part of this
    /// single `&mut self` step, so there is no window in which two sends can
    /// observe the same counter.
    pub fn seal_next<R: RngCore + CryptoRng>(
        &mut self,
        plaintext: &[u8],
        rng: &mut R,
    ) -> OutboundEnvelope {
        let mut random_prefix = [0u8; NONCE_RANDOM_SIZE];
        rng.fill_bytes(&mut random_prefix);

        let counter = self.next_send_counter;
        let sealed = seal_message(plaintext, &self.shared_key, counter, random_prefix);
        self.next_send_counter = counter + 1;

        OutboundEnvelope {
            chat_id: self.chat_id,
            sender_id: self.local_user,
            encrypted_content: sealed.ciphertext,
            nonce: sealed.nonce,
            message_counter: counter,
        }
    }

    /// Seal an outbound message with an explicit counter.
    ///
    /// For callers that manage the counter themselves. The counter must be
    /// at or ahead of the session's own; gaps are safe, reuse is not.
    ///
    /// # Errors
    ///
    /// [`EngineError::CounterDesync`] when `counter` is behind the session's
    /// next counter. This is a programming error and the send is aborted
    /// rather than emit a duplicate nonce.
    pub fn seal_with_counter<R: RngCore + CryptoRng>(
        &mut self,
        plaintext: &[u8],
        counter: u64,
        rng: &mut R,
    ) -> Result<OutboundEnvelope, EngineError> {
        if counter < self.next_send_counter {
            return Err(EngineError::CounterDesync {
                current: self.next_send_counter,
                attempted: counter,
            });
        }

        let mut random_prefix = [0u8; NONCE_RANDOM_SIZE];
        rng.fill_bytes(&mut random_prefix);

        let sealed = seal_message(plaintext, &self.shared_key, counter, random_prefix);
        self.next_send_counter = counter + 1;

        Ok(OutboundEnvelope {
            chat_id: self.chat_id,
            sender_id: self.local_user,
            encrypted_content: sealed.ciphertext,
            nonce: sealed.nonce,
            message_counter: counter,
        })
    }

    /// Decrypt one message body.
    ///
    /// Never fails the stream: callers drop `Failed` messages and continue.
    pub fn open(&self, ciphertext: &[u8], nonce: &[u8; NONCE_SIZE]) -> DecryptOutcome {
        match open_message(ciphertext, nonce, &self.shared_key) {
            Ok(plaintext) => DecryptOutcome::Decrypted(plaintext),
            Err(_) => DecryptOutcome::Failed(DecryptFailure::Authentication),
        }
    }

    /// Decrypt one message body attributed to `sender_id`.
    ///
    /// A sender outside this session's participants does not match the
    /// established shared key and is reported as
    /// [`DecryptFailure::ForeignSender`] without attempting decryption.
    /// Both the realtime and history paths consume this uniformly.
    pub fn open_from(
        &self,
        sender_id: UserId,
        ciphertext: &[u8],
        nonce: &[u8; NONCE_SIZE],
    ) -> DecryptOutcome {
        if !self.is_participant(sender_id) {
            return DecryptOutcome::Failed(DecryptFailure::ForeignSender { sender_id });
        }
        self.open(ciphertext, nonce)
    }

    /// Raise the send counter to at least `floor`.
    ///
    /// Used by history reconciliation: after observing own-sent counters up
    /// to `n` in the log, the next send must use at least `n + 1`. Never
    /// moves the counter backwards.
    pub fn reseed_counter(&mut self, floor: u64) {
        if floor > self.next_send_counter {
            tracing::debug!(
                chat_id = %self.chat_id,
                from = self.next_send_counter,
                to = floor,
                "reseeding send counter from history"
            );
            self.next_send_counter = floor;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::rngs::OsRng;
    use sealchat_crypto::KeyPair;

    use super::{ChatSession, DecryptFailure, DecryptOutcome};
    use crate::{
        error::EngineError,
        types::{ChatId, LocalKeyMaterial, UserId},
    };

    const CHAT: ChatId = ChatId(7);

    fn session_pair() -> (ChatSession, ChatSession) {
        let alice = KeyPair::generate(&mut OsRng);
        let bob = KeyPair::generate(&mut OsRng);

        let alice_material =
            LocalKeyMaterial { secret_key: alice.secret.clone(), bound_user_id: UserId(1) };
        let bob_material =
            LocalKeyMaterial { secret_key: bob.secret.clone(), bound_user_id: UserId(2) };

        let alice_session =
            ChatSession::establish(CHAT, &alice_material, UserId(2), &bob.public).unwrap();
        let bob_session =
            ChatSession::establish(CHAT, &bob_material, UserId(1), &alice.public).unwrap();

        (alice_session, bob_session)
    }

    #[test]
    fn both_sides_derive_the_same_key() {
        let (mut alice, bob) = session_pair();

        let envelope = alice.seal_next(b"hello bob", &mut OsRng);
        let outcome = bob.open(&envelope.encrypted_content, &envelope.nonce);

        assert_eq!(outcome, DecryptOutcome::Decrypted(b"hello bob".to_vec()));
    }

    #[test]
    fn seal_next_increments_counter() {
        let (mut alice, _) = session_pair();

        let first = alice.seal_next(b"one", &mut OsRng);
        let second = alice.seal_next(b"two", &mut OsRng);

        assert_eq!(first.message_counter, 0);
        assert_eq!(second.message_counter, 1);
        assert_eq!(alice.next_send_counter(), 2);
    }

    #[test]
    fn ten_thousand_sends_never_repeat_a_nonce() {
        let (mut alice, _) = session_pair();
        let mut nonces = HashSet::with_capacity(10_000);

        for _ in 0..10_000 {
            let envelope = alice.seal_next(b"m", &mut OsRng);
            assert!(nonces.insert(envelope.nonce), "nonce repeated");
        }
    }

    #[test]
    fn counter_reuse_is_rejected() {
        let (mut alice, _) = session_pair();
        alice.seal_next(b"one", &mut OsRng);
        alice.seal_next(b"two", &mut OsRng);

        let result = alice.seal_with_counter(b"stale retry", 1, &mut OsRng);
        assert_eq!(result.unwrap_err(), EngineError::CounterDesync { current: 2, attempted: 1 });
        // The failed attempt must not have advanced anything.
        assert_eq!(alice.next_send_counter(), 2);
    }

    #[test]
    fn explicit_counter_may_leave_a_gap() {
        let (mut alice, bob) = session_pair();

        let envelope = alice.seal_with_counter(b"skipped ahead", 10, &mut OsRng).unwrap();
        assert_eq!(envelope.message_counter, 10);
        assert_eq!(alice.next_send_counter(), 11);

        let outcome = bob.open(&envelope.encrypted_content, &envelope.nonce);
        assert_eq!(outcome, DecryptOutcome::Decrypted(b"skipped ahead".to_vec()));
    }

    #[test]
    fn open_with_wrong_session_fails_not_panics() {
        let (mut alice, _) = session_pair();
        let (_, mallory_session) = session_pair(); // unrelated keys

        let envelope = alice.seal_next(b"for bob only", &mut OsRng);
        let outcome = mallory_session.open(&envelope.encrypted_content, &envelope.nonce);

        assert_eq!(outcome, DecryptOutcome::Failed(DecryptFailure::Authentication));
    }

    #[test]
    fn tampered_payload_is_droppable() {
        let (mut alice, bob) = session_pair();
        let mut envelope = alice.seal_next(b"original", &mut OsRng);
        envelope.encrypted_content[0] ^= 0xFF;

        let outcome = bob.open(&envelope.encrypted_content, &envelope.nonce);
        assert!(matches!(outcome, DecryptOutcome::Failed(_)));
    }

    #[test]
    fn reseed_only_moves_forward() {
        let (mut alice, _) = session_pair();
        alice.reseed_counter(43);
        assert_eq!(alice.next_send_counter(), 43);

        alice.reseed_counter(10);
        assert_eq!(alice.next_send_counter(), 43);
    }

    #[test]
    fn foreign_sender_is_reported_without_decrypting() {
        let (mut alice, bob) = session_pair();
        let envelope = alice.seal_next(b"payload", &mut OsRng);

        let outcome = bob.open_from(UserId(99), &envelope.encrypted_content, &envelope.nonce);
        assert_eq!(
            outcome,
            DecryptOutcome::Failed(DecryptFailure::ForeignSender { sender_id: UserId(99) })
        );

        // The same bytes from a participant decrypt normally.
        let outcome = bob.open_from(UserId(1), &envelope.encrypted_content, &envelope.nonce);
        assert_eq!(outcome, DecryptOutcome::Decrypted(b"payload".to_vec()));
    }

    #[test]
    fn participants_are_tracked() {
        let (alice, _) = session_pair();
        assert!(alice.is_participant(UserId(1)));
        assert!(alice.is_participant(UserId(2)));
        assert!(!alice.is_participant(UserId(3)));
    }
}
