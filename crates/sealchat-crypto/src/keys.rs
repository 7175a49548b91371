//! Asymmetric identity keys and symmetric key wrappers.
//!
//! One X25519 keypair identifies a user on the messaging channel. The
//! public half is the only part ever transmitted unprotected; the secret
//! half lives in device storage or inside the password envelope.

use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use x25519_dalek::StaticSecret;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of every key in this module (X25519 and XChaCha20 both use 32 bytes).
pub const KEY_SIZE: usize = 32;

/// Public half of an identity keypair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey([u8; KEY_SIZE]);

impl PublicKey {
    /// Construct from raw bytes (e.g. fetched from the key directory).
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    pub(crate) fn to_x25519(self) -> x25519_dalek::PublicKey {
        x25519_dalek::PublicKey::from(self.0)
    }
}

/// Secret half of an identity keypair.
///
/// Zeroized on drop. `Debug` is redacted so the key cannot leak through
/// logging or error formatting.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey([u8; KEY_SIZE]);

impl SecretKey {
    /// Construct from raw bytes (e.g. recovered from the password envelope).
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    /// The public key this secret key corresponds to.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(x25519_dalek::PublicKey::from(&self.to_x25519()).to_bytes())
    }

    pub(crate) fn to_x25519(&self) -> StaticSecret {
        StaticSecret::from(self.0)
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretKey").field("key", &"[REDACTED]").finish()
    }
}

/// A 32-byte symmetric key: either password-derived (master key) or
/// session-derived (shared key).
///
/// Never persisted, never logged. Zeroized on drop, `Debug` redacted.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; KEY_SIZE]);

impl SymmetricKey {
    /// Wrap raw derived key bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymmetricKey").field("key", &"[REDACTED]").finish()
    }
}

/// A full identity keypair, generated once per user.
#[derive(Debug, Clone)]
pub struct KeyPair {
    /// Public half, published to the key directory.
    pub public: PublicKey,
    /// Secret half, held locally or inside the password envelope.
    pub secret: SecretKey,
}

impl KeyPair {
    /// Generate a fresh keypair from the given CSPRNG.
    ///
    /// Entropy failure is fatal by construction: `OsRng` aborts rather than
    /// return weak bytes.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let secret = StaticSecret::random_from_rng(&mut *rng);
        let public = x25519_dalek::PublicKey::from(&secret);
        Self {
            public: PublicKey(public.to_bytes()),
            secret: SecretKey(secret.to_bytes()),
        }
    }
}
