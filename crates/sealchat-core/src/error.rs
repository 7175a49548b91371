//! Error taxonomy for the messaging core.
//!
//! Per-message cryptographic failures are recovered locally: the message is
//! dropped from the decrypted view and the stream continues (see
//! [`crate::session::DecryptOutcome`]). The variants here are the failures
//! that propagate to callers. None of them ever carry key material or raw
//! nonces in their rendered text.

use thiserror::Error;

use crate::{
    directory::DirectoryError,
    secure_store::StoreError,
    transport::TransportError,
    types::{ChatId, UserId},
};

/// Errors surfaced by the key lifecycle, session, and reconciliation layers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Wrong password or tampered/forged ciphertext, never distinguished
    /// further, and never an indication of whether the user exists.
    #[error("authentication failed")]
    Authentication,

    /// The counterpart has no registered public key; the caller must not
    /// fall back to plaintext.
    #[error("no key material registered for user {user_id}")]
    NoKeyMaterial {
        /// The counterpart that has not registered.
        user_id: UserId,
    },

    /// An encrypted key record already exists for this user; registration is
    /// one-time.
    #[error("key record already exists for this user")]
    Conflict,

    /// A caller attempted to reuse a send counter. Programming error: the
    /// send is aborted rather than emit a duplicate nonce.
    #[error("send counter desync: attempted {attempted}, counter already at {current}")]
    CounterDesync {
        /// The session's current next send counter.
        current: u64,
        /// The counter value the caller attempted to use.
        attempted: u64,
    },

    /// Operation requires unlocked key material.
    #[error("key material is locked")]
    Locked,

    /// Messaging was attempted before a session was established for the
    /// chat.
    #[error("no established session for chat {chat_id}")]
    SessionNotEstablished {
        /// The chat without a session.
        chat_id: ChatId,
    },

    /// Cipher primitive failure outside the unlock path (e.g. unusable peer
    /// key during session establishment).
    #[error("crypto failure: {0}")]
    Crypto(#[from] sealchat_crypto::CryptoError),

    /// Key directory unavailable or misbehaving.
    #[error("key directory error: {0}")]
    Directory(String),

    /// Local secure storage failure.
    #[error("secure store error: {0}")]
    Store(#[from] StoreError),

    /// Transport failure. Retryable; history fetches mutate no counter state
    /// until a full batch is validated.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

impl From<DirectoryError> for EngineError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::Conflict => Self::Conflict,
            DirectoryError::Unavailable(reason) => Self::Directory(reason),
        }
    }
}
