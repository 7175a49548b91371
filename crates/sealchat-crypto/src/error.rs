//! Error types for the cipher primitives.

use thiserror::Error;

/// Errors that can occur in the cipher primitives.
///
/// [`Authentication`](CryptoError::Authentication) deliberately carries no
/// detail: a wrong key, a wrong password, and a tampered ciphertext all
/// produce the same variant, so callers cannot be turned into a decryption
/// oracle.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptoError {
    /// Decryption failed authentication (wrong key or tampered data).
    #[error("authentication failed")]
    Authentication,

    /// Key agreement received unusable key material.
    #[error("invalid key material")]
    InvalidKey,

    /// Recorded KDF parameters cannot produce a key.
    #[error("invalid key derivation parameters")]
    InvalidKdfParameters,
}
