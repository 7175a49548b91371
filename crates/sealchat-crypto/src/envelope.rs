//! Password envelope for the long-term secret key.
//!
//! The secret key is sealed under the password-derived master key and the
//! sealed blob travels to the key directory. Anyone who knows the password
//! can recover the identity on a fresh device; nobody else can, including
//! the directory itself.

use chacha20poly1305::{
    XChaCha20Poly1305, XNonce,
    aead::{Aead, KeyInit},
};
use zeroize::Zeroize;

use crate::{
    error::CryptoError,
    keys::{KEY_SIZE, SecretKey, SymmetricKey},
    message::NONCE_SIZE,
};

/// Seal a secret key under a master key.
///
/// The nonce is used exactly once per registration, so a fully random
/// 24-byte nonce is sufficient here; no counter discipline applies.
pub fn seal_secret_key(
    secret: &SecretKey,
    master_key: &SymmetricKey,
    nonce: &[u8; NONCE_SIZE],
) -> Vec<u8> {
    let cipher = XChaCha20Poly1305::new(master_key.as_bytes().into());
    let Ok(sealed) = cipher.encrypt(XNonce::from_slice(nonce), secret.as_bytes().as_slice())
    else {
        unreachable!("XChaCha20-Poly1305 encryption cannot fail with valid inputs");
    };
    sealed
}

/// Open a sealed secret key.
///
/// # Errors
///
/// [`CryptoError::Authentication`] on a wrong master key (wrong password) or
/// a corrupted blob, including a blob that authenticates but has the wrong
/// length. The cases are indistinguishable by design.
pub fn open_secret_key(
    sealed: &[u8],
    nonce: &[u8; NONCE_SIZE],
    master_key: &SymmetricKey,
) -> Result<SecretKey, CryptoError> {
    let cipher = XChaCha20Poly1305::new(master_key.as_bytes().into());
    let mut plaintext = cipher
        .decrypt(XNonce::from_slice(nonce), sealed)
        .map_err(|_| CryptoError::Authentication)?;

    let Ok(bytes) = <[u8; KEY_SIZE]>::try_from(plaintext.as_slice()) else {
        plaintext.zeroize();
        return Err(CryptoError::Authentication);
    };
    plaintext.zeroize();

    Ok(SecretKey::from_bytes(bytes))
}
