//! Fuzz target for the private-key password envelope
//!
//! # Strategy
//!
//! - Arbitrary secret keys, passwords, salts, and nonces
//! - Adversarial blobs fed straight to the opener
//!
//! # Invariants
//!
//! - Opening never panics on arbitrary input
//! - Roundtrip with the correct master key recovers the exact secret
//! - A different password never opens the envelope
//! - Arbitrary (unauthenticated) blobs never open

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sealchat_crypto::{
    KdfParameters, SecretKey, derive_key_from_password, open_secret_key, seal_secret_key,
};

#[derive(Debug, Clone, Arbitrary)]
struct EnvelopeScenario {
    secret: [u8; 32],
    password: Vec<u8>,
    other_password: Vec<u8>,
    salt: [u8; 16],
    nonce: [u8; 24],
    garbage_blob: Vec<u8>,
}

fuzz_target!(|scenario: EnvelopeScenario| {
    // Minimal iterations: the fuzzer exercises structure, not work factor.
    let params = KdfParameters { iterations: 1, ..KdfParameters::default() };
    let master = derive_key_from_password(&scenario.password, &scenario.salt, &params)
        .expect("non-zero iterations must derive");

    let secret = SecretKey::from_bytes(scenario.secret);
    let sealed = seal_secret_key(&secret, &master, &scenario.nonce);

    // INVARIANT 1: roundtrip recovers the exact secret
    let recovered = open_secret_key(&sealed, &scenario.nonce, &master)
        .expect("correct master key must open");
    assert_eq!(recovered.as_bytes(), secret.as_bytes());

    // INVARIANT 2: a different password fails, without panicking
    if scenario.other_password != scenario.password {
        let other = derive_key_from_password(&scenario.other_password, &scenario.salt, &params)
            .expect("non-zero iterations must derive");
        assert!(open_secret_key(&sealed, &scenario.nonce, &other).is_err());
    }

    // INVARIANT 3: arbitrary blobs never open (and never panic)
    if scenario.garbage_blob != sealed {
        assert!(open_secret_key(&scenario.garbage_blob, &scenario.nonce, &master).is_err());
    }
});
