//! Password-based key derivation (PBKDF2-HMAC-SHA256).
//!
//! Derives the master key that seals the user's secret key. The parameters
//! and a per-user random salt are recorded next to the sealed blob so the
//! same password reproduces the same key on any device; that determinism is
//! what cross-device recovery depends on.

use pbkdf2::pbkdf2_hmac;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::{
    error::CryptoError,
    keys::{KEY_SIZE, SymmetricKey},
};

/// Size of the per-user random KDF salt.
pub const SALT_SIZE: usize = 16;

/// Default PBKDF2 iteration count for new registrations.
pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 210_000;

/// KDF algorithm identifier recorded alongside every key record.
///
/// A single variant today; the record carries it so a future algorithm
/// change cannot silently reinterpret old salts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KdfAlgorithm {
    /// PBKDF2 with HMAC-SHA256 as the PRF.
    Pbkdf2HmacSha256,
}

/// Parameters for password key derivation.
///
/// Immutable once recorded for a given key generation: changing them would
/// make the recorded envelope unopenable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParameters {
    /// Which KDF produced the recorded envelope key.
    pub algorithm: KdfAlgorithm,
    /// Iteration count (work factor).
    pub iterations: u32,
}

impl Default for KdfParameters {
    fn default() -> Self {
        Self {
            algorithm: KdfAlgorithm::Pbkdf2HmacSha256,
            iterations: DEFAULT_PBKDF2_ITERATIONS,
        }
    }
}

/// Derive a 32-byte key from a password, salt, and recorded parameters.
///
/// Deterministic given identical inputs.
///
/// # Errors
///
/// Fails closed with [`CryptoError::InvalidKdfParameters`] on a zero
/// iteration count (a corrupt or hostile record must not yield a weak key).
pub fn derive_key_from_password(
    password: &[u8],
    salt: &[u8; SALT_SIZE],
    params: &KdfParameters,
) -> Result<SymmetricKey, CryptoError> {
    if params.iterations == 0 {
        return Err(CryptoError::InvalidKdfParameters);
    }

    let KdfAlgorithm::Pbkdf2HmacSha256 = params.algorithm;

    let mut key = [0u8; KEY_SIZE];
    pbkdf2_hmac::<Sha256>(password, salt, params.iterations, &mut key);
    Ok(SymmetricKey::from_bytes(key))
}
