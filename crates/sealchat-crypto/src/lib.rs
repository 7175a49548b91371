//! Sealchat Cryptographic Primitives
//!
//! Cryptographic building blocks for the Sealchat direct-messaging engine.
//! Pure functions with deterministic outputs. Callers provide random bytes,
//! which keeps every primitive testable without mocking an entropy source.
//!
//! # Key Lifecycle
//!
//! Each user owns one long-term X25519 keypair for the messaging channel.
//! The secret half never leaves the device in the clear: at registration it
//! is sealed under a password-derived key and the sealed blob is stored
//! server-side, which is what makes password-based recovery on a new device
//! possible.
//!
//! ```text
//! Password ── PBKDF2-HMAC-SHA256 ──► Master Key
//!                                        │
//! Secret Key ──── AEAD envelope ─────────┘──► EncryptedPrivateKeyRecord
//!
//! My Secret Key + Peer Public Key ── X25519 ── HKDF ──► Session Key
//!                                                          │
//! Plaintext + (random ‖ counter) nonce ── AEAD ────────────┘──► Ciphertext
//! ```
//!
//! # Security
//!
//! Nonce discipline:
//! - Message nonces are 24 bytes: a 16-byte random prefix and an 8-byte
//!   big-endian send counter
//! - The random prefix defends against counter reuse across process restarts
//! - The counter defends against random collision under a long-lived key
//! - Removing either half weakens the uniqueness guarantee
//!
//! Authenticity:
//! - XChaCha20-Poly1305 AEAD provides tamper-proof encryption
//! - Failed authentication surfaces as a single [`CryptoError::Authentication`]
//!   with no detail, so a wrong key and a corrupted ciphertext are
//!   indistinguishable to an observer
//!
//! Key hygiene:
//! - Secret and symmetric keys are zeroized on drop
//! - `Debug` output for key material is redacted

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod ecdh;
pub mod envelope;
pub mod error;
pub mod kdf;
pub mod keys;
pub mod message;

pub use ecdh::derive_shared_key;
pub use envelope::{open_secret_key, seal_secret_key};
pub use error::CryptoError;
pub use kdf::{
    DEFAULT_PBKDF2_ITERATIONS, KdfAlgorithm, KdfParameters, SALT_SIZE, derive_key_from_password,
};
pub use keys::{KEY_SIZE, KeyPair, PublicKey, SecretKey, SymmetricKey};
pub use message::{
    NONCE_RANDOM_SIZE, NONCE_SIZE, SealedMessage, build_nonce, open_message, seal_message,
};
