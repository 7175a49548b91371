//! Property-based tests for sessions and history reconciliation
//!
//! These tests verify the fundamental invariants of the messaging core:
//!
//! 1. **Nonce uniqueness**: sequential sends never repeat a nonce
//! 2. **Symmetry**: whatever one side seals, the other side opens
//! 3. **Reseed floor**: after reconciliation the next send counter is
//!    strictly above every own counter observed in the batch
//! 4. **Corruption isolation**: corrupt messages drop individually

use std::collections::HashSet;

use proptest::prelude::*;
use rand::rngs::OsRng;
use sealchat_core::{
    ChatId, ChatMessage, ChatSession, DecryptOutcome, LocalKeyMaterial, OutboundEnvelope, UserId,
    reconcile_page,
};
use sealchat_crypto::SecretKey;

const CHAT: ChatId = ChatId(1);
const ALICE: UserId = UserId(1);
const BOB: UserId = UserId(2);

/// Build both ends of a conversation from fixed secret bytes so proptest
/// can explore the key space deterministically.
fn conversation(alice_bytes: [u8; 32], bob_bytes: [u8; 32]) -> (ChatSession, ChatSession) {
    let alice_secret = SecretKey::from_bytes(alice_bytes);
    let bob_secret = SecretKey::from_bytes(bob_bytes);
    let alice_public = alice_secret.public_key();
    let bob_public = bob_secret.public_key();

    let alice_material = LocalKeyMaterial { secret_key: alice_secret, bound_user_id: ALICE };
    let bob_material = LocalKeyMaterial { secret_key: bob_secret, bound_user_id: BOB };

    let alice = ChatSession::establish(CHAT, &alice_material, BOB, &bob_public).unwrap();
    let bob = ChatSession::establish(CHAT, &bob_material, ALICE, &alice_public).unwrap();
    (alice, bob)
}

fn stored(envelope: OutboundEnvelope, timestamp_ms: u64) -> ChatMessage {
    ChatMessage {
        chat_id: envelope.chat_id,
        sender_id: envelope.sender_id,
        encrypted_content: envelope.encrypted_content,
        nonce: envelope.nonce,
        message_counter: envelope.message_counter,
        timestamp_ms,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn prop_sequential_sends_unique_nonces(
        alice_bytes in any::<[u8; 32]>(),
        bob_bytes in any::<[u8; 32]>(),
        count in 1usize..200,
    ) {
        let (mut alice, _) = conversation(alice_bytes, bob_bytes);
        let mut nonces = HashSet::with_capacity(count);

        for _ in 0..count {
            let envelope = alice.seal_next(b"m", &mut OsRng);
            prop_assert!(nonces.insert(envelope.nonce), "nonce repeated");
        }
    }

    #[test]
    fn prop_peer_opens_every_sealed_message(
        alice_bytes in any::<[u8; 32]>(),
        bob_bytes in any::<[u8; 32]>(),
        plaintexts in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..100), 1..20),
    ) {
        let (mut alice, bob) = conversation(alice_bytes, bob_bytes);

        for plaintext in &plaintexts {
            let envelope = alice.seal_next(plaintext, &mut OsRng);
            let outcome = bob.open(&envelope.encrypted_content, &envelope.nonce);
            prop_assert_eq!(outcome, DecryptOutcome::Decrypted(plaintext.clone()));
        }
    }

    #[test]
    fn prop_reseed_exceeds_all_own_counters(
        alice_bytes in any::<[u8; 32]>(),
        bob_bytes in any::<[u8; 32]>(),
        counters in prop::collection::btree_set(0u64..10_000, 1..30),
    ) {
        let (mut original, _) = conversation(alice_bytes, bob_bytes);

        // Send at the chosen counters (ascending, arbitrary gaps).
        let batch: Vec<ChatMessage> = counters
            .iter()
            .enumerate()
            .map(|(i, &counter)| {
                let envelope = original
                    .seal_with_counter(b"m", counter, &mut OsRng)
                    .unwrap();
                stored(envelope, i as u64)
            })
            .collect();

        // A fresh session over the same identity starts at zero.
        let (mut restored, _) = conversation(alice_bytes, bob_bytes);
        reconcile_page(&mut restored, &batch);

        let max = counters.iter().copied().max().unwrap_or(0);
        let next = restored.seal_next(b"after", &mut OsRng);
        prop_assert!(next.message_counter > max, "next counter must exceed every observed one");
    }

    #[test]
    fn prop_corruption_drops_exactly_the_corrupted(
        alice_bytes in any::<[u8; 32]>(),
        bob_bytes in any::<[u8; 32]>(),
        count in 2usize..30,
        corrupt_choice in any::<prop::sample::Index>(),
    ) {
        let (mut alice, mut bob) = conversation(alice_bytes, bob_bytes);
        let mut batch: Vec<ChatMessage> = (0..count)
            .map(|i| stored(bob.seal_next(b"page entry", &mut OsRng), i as u64))
            .collect();

        let corrupt_at = corrupt_choice.index(count);
        batch[corrupt_at].encrypted_content[0] ^= 0xFF;

        let outcome = reconcile_page(&mut alice, &batch);

        prop_assert_eq!(outcome.decrypted.len(), count - 1);
        prop_assert_eq!(outcome.dropped, 1);
    }
}
