//! Per-message encryption using `XChaCha20-Poly1305` and nonce construction.
//!
//! All functions are pure; random bytes must be provided by the caller.
//! This enables deterministic testing and keeps the nonce discipline visible
//! at the call site.

use chacha20poly1305::{
    XChaCha20Poly1305, XNonce,
    aead::{Aead, KeyInit},
};

use crate::{error::CryptoError, keys::SymmetricKey};

/// Size of the `XChaCha20` nonce (24 bytes).
pub const NONCE_SIZE: usize = 24;

/// Size of the random prefix in the nonce (16 bytes).
pub const NONCE_RANDOM_SIZE: usize = 16;

/// Poly1305 tag size (16 bytes).
const POLY1305_TAG_SIZE: usize = 16;

/// An encrypted message with the metadata needed for decryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedMessage {
    /// The 24-byte `XChaCha20` nonce.
    pub nonce: [u8; NONCE_SIZE],
    /// The ciphertext including the 16-byte Poly1305 tag.
    pub ciphertext: Vec<u8>,
    /// The send counter encoded into the nonce.
    pub counter: u64,
}

impl SealedMessage {
    /// Plaintext length (ciphertext length minus authentication tag).
    pub fn plaintext_len(&self) -> usize {
        self.ciphertext.len().saturating_sub(POLY1305_TAG_SIZE)
    }
}

/// Build a 24-byte nonce from the sender's counter.
///
/// Structure:
/// - bytes 0-15: random prefix (caller-provided)
/// - bytes 16-23: counter (big-endian)
///
/// The random prefix defends against counter reuse across process restarts
/// or multi-writer races; the counter defends against random collision under
/// a long-lived key. Both halves are required for the uniqueness guarantee.
pub fn build_nonce(counter: u64, random_prefix: [u8; NONCE_RANDOM_SIZE]) -> [u8; NONCE_SIZE] {
    let mut nonce = [0u8; NONCE_SIZE];
    nonce[..NONCE_RANDOM_SIZE].copy_from_slice(&random_prefix);
    nonce[NONCE_RANDOM_SIZE..].copy_from_slice(&counter.to_be_bytes());
    nonce
}

/// Encrypt a message under a session key with a counter-derived nonce.
///
/// Caller contract: `counter` must be the sender's own next send counter,
/// incremented only after this call succeeds and never reused, not even
/// across retries (construct a new outbound record instead).
pub fn seal_message(
    plaintext: &[u8],
    key: &SymmetricKey,
    counter: u64,
    random_prefix: [u8; NONCE_RANDOM_SIZE],
) -> SealedMessage {
    let nonce = build_nonce(counter, random_prefix);
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());

    let Ok(ciphertext) = cipher.encrypt(XNonce::from_slice(&nonce), plaintext) else {
        unreachable!("XChaCha20-Poly1305 encryption cannot fail with valid inputs");
    };

    SealedMessage { nonce, ciphertext, counter }
}

/// Decrypt a message under a session key.
///
/// # Errors
///
/// [`CryptoError::Authentication`] on any failure: wrong key, tampered
/// ciphertext, or mismatched nonce. The variants are deliberately not
/// distinguished.
pub fn open_message(
    ciphertext: &[u8],
    nonce: &[u8; NONCE_SIZE],
    key: &SymmetricKey,
) -> Result<Vec<u8>, CryptoError> {
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
    cipher
        .decrypt(XNonce::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::Authentication)
}

#[cfg(test)]
mod tests {
    use super::{NONCE_RANDOM_SIZE, POLY1305_TAG_SIZE, build_nonce, open_message, seal_message};
    use crate::keys::SymmetricKey;

    fn test_key(fill: u8) -> SymmetricKey {
        SymmetricKey::from_bytes([fill; 32])
    }

    #[test]
    fn seal_open_roundtrip() {
        let key = test_key(0x11);
        let sealed = seal_message(b"Hello, World!", &key, 7, [0xAB; NONCE_RANDOM_SIZE]);
        let opened = open_message(&sealed.ciphertext, &sealed.nonce, &key).unwrap();
        assert_eq!(opened, b"Hello, World!");
    }

    #[test]
    fn seal_open_empty_message() {
        let key = test_key(0x22);
        let sealed = seal_message(b"", &key, 0, [0x00; NONCE_RANDOM_SIZE]);
        let opened = open_message(&sealed.ciphertext, &sealed.nonce, &key).unwrap();
        assert_eq!(opened, b"");
    }

    #[test]
    fn seal_open_large_message() {
        let key = test_key(0x33);
        let plaintext = vec![0x42u8; 64 * 1024];
        let sealed = seal_message(&plaintext, &key, u64::MAX, [0xFF; NONCE_RANDOM_SIZE]);
        let opened = open_message(&sealed.ciphertext, &sealed.nonce, &key).unwrap();
        assert_eq!(opened, plaintext);
    }

    #[test]
    fn ciphertext_is_larger_than_plaintext() {
        let key = test_key(0x44);
        let sealed = seal_message(b"test message", &key, 1, [0x00; NONCE_RANDOM_SIZE]);
        assert_eq!(sealed.ciphertext.len(), b"test message".len() + POLY1305_TAG_SIZE);
        assert_eq!(sealed.plaintext_len(), b"test message".len());
    }

    #[test]
    fn wrong_key_fails_authentication() {
        let sealed = seal_message(b"secret", &test_key(0x55), 1, [0x00; NONCE_RANDOM_SIZE]);
        let result = open_message(&sealed.ciphertext, &sealed.nonce, &test_key(0x56));
        assert!(result.is_err());
    }

    #[test]
    fn tampered_ciphertext_fails_authentication() {
        let key = test_key(0x66);
        let mut sealed = seal_message(b"original", &key, 1, [0x00; NONCE_RANDOM_SIZE]);
        sealed.ciphertext[0] ^= 0xFF;
        assert!(open_message(&sealed.ciphertext, &sealed.nonce, &key).is_err());
    }

    #[test]
    fn tampered_nonce_fails_authentication() {
        let key = test_key(0x77);
        let mut sealed = seal_message(b"original", &key, 1, [0x00; NONCE_RANDOM_SIZE]);
        sealed.nonce[0] ^= 0x01;
        assert!(open_message(&sealed.ciphertext, &sealed.nonce, &key).is_err());
    }

    #[test]
    fn nonce_structure() {
        let nonce = build_nonce(0x0102_0304_0506_0708, [0xAB; NONCE_RANDOM_SIZE]);

        // Random prefix (bytes 0-15)
        assert_eq!(&nonce[..16], &[0xAB; 16]);

        // Counter, big-endian (bytes 16-23)
        assert_eq!(&nonce[16..], &[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]);
    }

    #[test]
    fn different_counters_produce_different_nonces() {
        let nonce_a = build_nonce(1, [0x00; NONCE_RANDOM_SIZE]);
        let nonce_b = build_nonce(2, [0x00; NONCE_RANDOM_SIZE]);
        assert_ne!(nonce_a, nonce_b);
    }

    #[test]
    fn different_random_produces_different_ciphertext() {
        let key = test_key(0x88);
        let sealed_a = seal_message(b"test", &key, 1, [0x00; NONCE_RANDOM_SIZE]);
        let sealed_b = seal_message(b"test", &key, 1, [0xFF; NONCE_RANDOM_SIZE]);

        assert_ne!(sealed_a.nonce, sealed_b.nonce);
        assert_ne!(sealed_a.ciphertext, sealed_b.ciphertext);
    }

    #[test]
    fn sealed_message_carries_counter() {
        let sealed = seal_message(b"x", &test_key(0x99), 42, [0x00; NONCE_RANDOM_SIZE]);
        assert_eq!(sealed.counter, 42);
    }
}
