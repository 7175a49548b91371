//! Property-based tests for the cipher primitives
//!
//! These tests verify the fundamental invariants of the subsystem:
//!
//! 1. **Commutativity**: both sides of a key agreement derive the same key
//! 2. **Round-trip**: open(seal(m)) == m for all messages
//! 3. **Nonce uniqueness**: distinct counters never collide
//! 4. **Tamper detection**: any bit flip fails authentication

use proptest::prelude::*;
use sealchat_crypto::{
    NONCE_RANDOM_SIZE, SecretKey, SymmetricKey, build_nonce, derive_shared_key, open_message,
    seal_message,
};

fn secret_from(bytes: [u8; 32]) -> SecretKey {
    SecretKey::from_bytes(bytes)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_shared_key_commutative(
        a_bytes in any::<[u8; 32]>(),
        b_bytes in any::<[u8; 32]>(),
    ) {
        let a = secret_from(a_bytes);
        let b = secret_from(b_bytes);

        let key_a = derive_shared_key(&b.public_key(), &a).unwrap();
        let key_b = derive_shared_key(&a.public_key(), &b).unwrap();

        prop_assert_eq!(key_a.as_bytes(), key_b.as_bytes());
    }

    #[test]
    fn prop_seal_open_roundtrip(
        plaintext in prop::collection::vec(any::<u8>(), 0..1000),
        key_bytes in any::<[u8; 32]>(),
        counter in any::<u64>(),
        random_prefix in any::<[u8; NONCE_RANDOM_SIZE]>(),
    ) {
        let key = SymmetricKey::from_bytes(key_bytes);
        let sealed = seal_message(&plaintext, &key, counter, random_prefix);
        let opened = open_message(&sealed.ciphertext, &sealed.nonce, &key).unwrap();

        prop_assert_eq!(opened, plaintext);
    }

    #[test]
    fn prop_distinct_counters_distinct_nonces(
        counter_a in any::<u64>(),
        counter_b in any::<u64>(),
        random_prefix in any::<[u8; NONCE_RANDOM_SIZE]>(),
    ) {
        prop_assume!(counter_a != counter_b);

        // Even with an identical random prefix (worst case), the counter
        // half alone keeps the nonces distinct.
        let nonce_a = build_nonce(counter_a, random_prefix);
        let nonce_b = build_nonce(counter_b, random_prefix);

        prop_assert_ne!(nonce_a, nonce_b);
    }

    #[test]
    fn prop_bit_flip_fails_authentication(
        plaintext in prop::collection::vec(any::<u8>(), 1..200),
        key_bytes in any::<[u8; 32]>(),
        counter in any::<u64>(),
        flip_choice in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let key = SymmetricKey::from_bytes(key_bytes);
        let sealed = seal_message(&plaintext, &key, counter, [0x5A; NONCE_RANDOM_SIZE]);

        // Flip one bit anywhere in the ciphertext or the nonce.
        let mut ciphertext = sealed.ciphertext.clone();
        let mut nonce = sealed.nonce;
        let total = ciphertext.len() + nonce.len();
        let pos = flip_choice.index(total);
        if pos < ciphertext.len() {
            ciphertext[pos] ^= 1 << bit;
        } else {
            nonce[pos - ciphertext.len()] ^= 1 << bit;
        }

        let result = open_message(&ciphertext, &nonce, &key);
        prop_assert!(result.is_err(), "tampered message must never open");
    }

    #[test]
    fn prop_wrong_key_fails_authentication(
        plaintext in prop::collection::vec(any::<u8>(), 0..200),
        key_bytes in any::<[u8; 32]>(),
        other_bytes in any::<[u8; 32]>(),
        counter in any::<u64>(),
    ) {
        prop_assume!(key_bytes != other_bytes);

        let key = SymmetricKey::from_bytes(key_bytes);
        let other = SymmetricKey::from_bytes(other_bytes);
        let sealed = seal_message(&plaintext, &key, counter, [0x00; NONCE_RANDOM_SIZE]);

        prop_assert!(open_message(&sealed.ciphertext, &sealed.nonce, &other).is_err());
    }
}
