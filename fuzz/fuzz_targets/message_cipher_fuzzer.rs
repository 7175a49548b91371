//! Fuzz target for the per-message cipher and nonce construction
//!
//! # Strategy
//!
//! - Arbitrary plaintexts (empty, small, large)
//! - Boundary counter values (0, MAX)
//! - Arbitrary random prefixes and keys
//! - Corruption at arbitrary positions
//!
//! # Invariants
//!
//! - Sealing never panics
//! - Roundtrip succeeds with the correct key
//! - Corrupted ciphertext or nonce fails authentication
//! - The nonce encodes the counter in its trailing 8 bytes

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sealchat_crypto::{NONCE_RANDOM_SIZE, SymmetricKey, build_nonce, open_message, seal_message};

#[derive(Debug, Clone, Arbitrary)]
struct CipherScenario {
    plaintext: Vec<u8>,
    key: [u8; 32],
    other_key: [u8; 32],
    counter: u64,
    random_prefix: [u8; NONCE_RANDOM_SIZE],
    corrupt_at: usize,
    corrupt_bit: u8,
}

fuzz_target!(|scenario: CipherScenario| {
    let key = SymmetricKey::from_bytes(scenario.key);

    // INVARIANT 1: sealing never panics, ciphertext >= plaintext
    let sealed = seal_message(&scenario.plaintext, &key, scenario.counter, scenario.random_prefix);
    assert!(sealed.ciphertext.len() >= scenario.plaintext.len());
    assert_eq!(sealed.counter, scenario.counter);

    // INVARIANT 2: the nonce is prefix || big-endian counter
    assert_eq!(sealed.nonce, build_nonce(scenario.counter, scenario.random_prefix));
    assert_eq!(&sealed.nonce[NONCE_RANDOM_SIZE..], &scenario.counter.to_be_bytes());

    // INVARIANT 3: roundtrip succeeds
    let opened = open_message(&sealed.ciphertext, &sealed.nonce, &key)
        .expect("valid ciphertext must open");
    assert_eq!(opened, scenario.plaintext);

    // INVARIANT 4: a different key fails authentication
    if scenario.other_key != scenario.key {
        let other = SymmetricKey::from_bytes(scenario.other_key);
        assert!(open_message(&sealed.ciphertext, &sealed.nonce, &other).is_err());
    }

    // INVARIANT 5: flipping any bit fails authentication
    let mut ciphertext = sealed.ciphertext.clone();
    let mut nonce = sealed.nonce;
    let total = ciphertext.len() + nonce.len();
    let pos = scenario.corrupt_at % total;
    let bit = 1u8 << (scenario.corrupt_bit % 8);
    if pos < ciphertext.len() {
        ciphertext[pos] ^= bit;
    } else {
        nonce[pos - ciphertext.len()] ^= bit;
    }
    assert!(open_message(&ciphertext, &nonce, &key).is_err());
});
