//! Fuzz target for history reconciliation
//!
//! # Strategy
//!
//! - Batches mixing genuine, corrupted, foreign-sender, and garbage messages
//! - Arbitrary own-sent counters with gaps
//!
//! # Invariants
//!
//! - Reconciliation never panics on adversarial batches
//! - Every genuine message decrypts, every other message is dropped
//! - After reconciliation the next send counter exceeds every own counter
//!   observed in the batch

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use rand::rngs::OsRng;
use sealchat_core::{
    ChatId, ChatMessage, ChatSession, LocalKeyMaterial, UserId, reconcile_page,
};
use sealchat_crypto::SecretKey;

const CHAT: ChatId = ChatId(1);
const ALICE: UserId = UserId(1);
const BOB: UserId = UserId(2);

#[derive(Debug, Clone, Arbitrary)]
enum BatchEntry {
    /// A genuine message sealed by the peer at the next counter.
    Genuine { body: Vec<u8> },
    /// A genuine message with one corrupted ciphertext byte.
    Corrupted { body: Vec<u8> },
    /// An own-sent message at an arbitrary counter offset (gaps allowed).
    OwnSent { body: Vec<u8>, counter_skip: u8 },
    /// Raw garbage attributed to a participant.
    Garbage { content: Vec<u8>, nonce: [u8; 24], counter: u64 },
    /// Raw garbage from an unknown sender.
    Foreign { sender: u64, content: Vec<u8> },
}

#[derive(Debug, Clone, Arbitrary)]
struct ReconcileScenario {
    alice_secret: [u8; 32],
    bob_secret: [u8; 32],
    entries: Vec<BatchEntry>,
}

fuzz_target!(|scenario: ReconcileScenario| {
    let alice_secret = SecretKey::from_bytes(scenario.alice_secret);
    let bob_secret = SecretKey::from_bytes(scenario.bob_secret);
    let alice_public = alice_secret.public_key();
    let bob_public = bob_secret.public_key();

    let alice_material = LocalKeyMaterial { secret_key: alice_secret, bound_user_id: ALICE };
    let bob_material = LocalKeyMaterial { secret_key: bob_secret, bound_user_id: BOB };

    let mut alice_sender =
        ChatSession::establish(CHAT, &alice_material, BOB, &bob_public).expect("establish");
    let mut bob_sender =
        ChatSession::establish(CHAT, &bob_material, ALICE, &alice_public).expect("establish");

    let mut batch = Vec::with_capacity(scenario.entries.len());
    let mut expected_decrypted = 0usize;
    let mut max_own_counter: Option<u64> = None;

    for (i, entry) in scenario.entries.iter().enumerate() {
        let timestamp_ms = i as u64;
        match entry {
            BatchEntry::Genuine { body } => {
                let envelope = bob_sender.seal_next(body, &mut OsRng);
                expected_decrypted += 1;
                batch.push(ChatMessage {
                    chat_id: envelope.chat_id,
                    sender_id: envelope.sender_id,
                    encrypted_content: envelope.encrypted_content,
                    nonce: envelope.nonce,
                    message_counter: envelope.message_counter,
                    timestamp_ms,
                });
            },
            BatchEntry::Corrupted { body } => {
                let envelope = bob_sender.seal_next(body, &mut OsRng);
                let mut content = envelope.encrypted_content;
                content[0] ^= 0xFF;
                batch.push(ChatMessage {
                    chat_id: envelope.chat_id,
                    sender_id: envelope.sender_id,
                    encrypted_content: content,
                    nonce: envelope.nonce,
                    message_counter: envelope.message_counter,
                    timestamp_ms,
                });
            },
            BatchEntry::OwnSent { body, counter_skip } => {
                let counter = alice_sender.next_send_counter() + u64::from(*counter_skip);
                let envelope = alice_sender
                    .seal_with_counter(body, counter, &mut OsRng)
                    .expect("counter at or ahead of next");
                expected_decrypted += 1;
                max_own_counter = Some(max_own_counter.map_or(counter, |m| m.max(counter)));
                batch.push(ChatMessage {
                    chat_id: envelope.chat_id,
                    sender_id: envelope.sender_id,
                    encrypted_content: envelope.encrypted_content,
                    nonce: envelope.nonce,
                    message_counter: envelope.message_counter,
                    timestamp_ms,
                });
            },
            BatchEntry::Garbage { content, nonce, counter } => {
                batch.push(ChatMessage {
                    chat_id: CHAT,
                    sender_id: BOB,
                    encrypted_content: content.clone(),
                    nonce: *nonce,
                    message_counter: *counter,
                    timestamp_ms,
                });
            },
            BatchEntry::Foreign { sender, content } => {
                // Offset keeps the sender disjoint from the participants.
                batch.push(ChatMessage {
                    chat_id: CHAT,
                    sender_id: UserId(sender % 1_000 + 100),
                    encrypted_content: content.clone(),
                    nonce: [0; 24],
                    message_counter: 0,
                    timestamp_ms,
                });
            },
        }
    }

    // Reconcile against a fresh session for the same identity (the
    // reinstalled-device shape).
    let mut restored =
        ChatSession::establish(CHAT, &alice_material, BOB, &bob_public).expect("establish");
    let outcome = reconcile_page(&mut restored, &batch);

    // INVARIANT 1: exact split between decrypted and dropped
    assert_eq!(outcome.decrypted.len(), expected_decrypted);
    assert_eq!(outcome.dropped, batch.len() - expected_decrypted);

    // INVARIANT 2: the counter baseline clears every own counter observed
    if let Some(max) = max_own_counter {
        assert!(restored.next_send_counter() > max);
    }
});
