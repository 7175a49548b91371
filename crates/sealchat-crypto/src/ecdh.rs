//! X25519 key agreement for chat sessions.
//!
//! Both participants derive the same symmetric key from their own secret key
//! and the counterpart's public key. No network interaction, no shared state:
//! the session key is recomputable on demand and never needs to be stored.

use hkdf::Hkdf;
use sha2::Sha256;

use crate::{
    error::CryptoError,
    keys::{KEY_SIZE, PublicKey, SecretKey, SymmetricKey},
};

/// Domain separation label for session key expansion.
const SESSION_KEY_INFO: &[u8] = b"sealchat session key v1";

/// Derive the symmetric session key shared between two identities.
///
/// Commutative by construction:
/// `derive_shared_key(a.public, b.secret) == derive_shared_key(b.public, a.secret)`
/// for any two keypairs `a` and `b`. The raw X25519 output is expanded
/// through HKDF-SHA256 under a fixed label before use as a cipher key.
///
/// # Errors
///
/// Fails closed with [`CryptoError::InvalidKey`] when the exchange is
/// non-contributory (a malformed or low-order peer key forcing an all-zero
/// shared secret). Never returns a zero or garbage key.
pub fn derive_shared_key(
    peer_public: &PublicKey,
    my_secret: &SecretKey,
) -> Result<SymmetricKey, CryptoError> {
    let shared = my_secret.to_x25519().diffie_hellman(&peer_public.to_x25519());
    if !shared.was_contributory() {
        return Err(CryptoError::InvalidKey);
    }

    let hkdf = Hkdf::<Sha256>::new(None, shared.as_bytes());
    let mut key = [0u8; KEY_SIZE];
    let Ok(()) = hkdf.expand(SESSION_KEY_INFO, &mut key) else {
        unreachable!("32 bytes is a valid HKDF-SHA256 output length");
    };

    Ok(SymmetricKey::from_bytes(key))
}
