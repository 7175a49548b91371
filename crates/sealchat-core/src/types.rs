//! Data model shared across the messaging core.

use sealchat_crypto::{KdfParameters, NONCE_SIZE, PublicKey, SALT_SIZE, SecretKey};
use serde::{Deserialize, Serialize};

/// Stable user identifier assigned by the account system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub u64);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable conversation identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChatId(pub u128);

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#034x}", self.0)
    }
}

/// Server-owned encrypted key record, one per user.
///
/// Created at registration and never mutated. The plaintext secret key never
/// appears in this record or on the wire: only the password-sealed blob, the
/// nonce it was sealed under, and the KDF inputs needed to re-derive the
/// master key on another device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedPrivateKeyRecord {
    /// The user's public key, served to counterparts for session setup.
    pub public_key: PublicKey,
    /// The secret key sealed under the password-derived master key.
    pub encrypted_private_key: Vec<u8>,
    /// Nonce the envelope was sealed under.
    pub private_key_nonce: [u8; NONCE_SIZE],
    /// Per-user random KDF salt.
    pub kdf_salt: [u8; SALT_SIZE],
    /// KDF parameters recorded at registration; immutable thereafter.
    pub kdf_params: KdfParameters,
}

/// Device-owned key material for the currently bound user.
///
/// Invariant: discarded immediately when `bound_user_id` does not match the
/// authenticated user: stale or foreign key material is never reused
/// silently.
#[derive(Debug, Clone)]
pub struct LocalKeyMaterial {
    /// The plaintext secret key (held only in local secure storage).
    pub secret_key: SecretKey,
    /// The user this material belongs to.
    pub bound_user_id: UserId,
}

/// A server-owned chat message, append-only and immutable once written.
///
/// `message_counter` is sender-scoped: strictly increasing per sender per
/// chat, with no ordering relationship across senders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Conversation this message belongs to.
    pub chat_id: ChatId,
    /// Sender identity.
    pub sender_id: UserId,
    /// AEAD ciphertext of the message body.
    pub encrypted_content: Vec<u8>,
    /// Nonce the body was sealed under.
    pub nonce: [u8; NONCE_SIZE],
    /// Sender-scoped send counter encoded into the nonce.
    pub message_counter: u64,
    /// Server-assigned timestamp, milliseconds.
    pub timestamp_ms: u64,
}

/// An outbound message handed to the transport.
///
/// Same shape as [`ChatMessage`] minus the timestamp, which the server
/// assigns on append.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundEnvelope {
    /// Conversation to append to.
    pub chat_id: ChatId,
    /// Sender identity.
    pub sender_id: UserId,
    /// AEAD ciphertext of the message body.
    pub encrypted_content: Vec<u8>,
    /// Nonce the body was sealed under.
    pub nonce: [u8; NONCE_SIZE],
    /// Sender-scoped send counter encoded into the nonce.
    pub message_counter: u64,
}

/// A successfully decrypted message, ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptedMessage {
    /// Conversation the message belongs to.
    pub chat_id: ChatId,
    /// Sender identity.
    pub sender_id: UserId,
    /// Decrypted message body.
    pub plaintext: Vec<u8>,
    /// Sender-scoped counter from the stored message.
    pub message_counter: u64,
    /// Server-assigned timestamp, milliseconds.
    pub timestamp_ms: u64,
}
