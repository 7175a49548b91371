//! Key lifecycle manager.
//!
//! Owns the user's long-term identity keypair across its whole life:
//! generation and registration, password unlock (including recovery on a
//! fresh device), password-free auto-unlock from local secure storage, and
//! lock/logout.
//!
//! # State Machine
//!
//! ```text
//! ┌──────────────┐  register   ┌────────┐  unlock / auto_unlock  ┌──────────┐
//! │ Unregistered │────────────>│ Locked │───────────────────────>│ Unlocked │
//! └──────────────┘             └────────┘<───────────────────────└──────────┘
//!                                                  lock
//! ```
//!
//! Once the directory holds a record there is no way back to
//! `Unregistered`; key rotation is out of scope.

use rand::{CryptoRng, RngCore};
use sealchat_crypto::{
    KdfParameters, KeyPair, NONCE_SIZE, PublicKey, SALT_SIZE, derive_key_from_password,
    open_secret_key, seal_secret_key,
};

use crate::{
    directory::KeyDirectory,
    error::EngineError,
    secure_store::SecureStore,
    types::{EncryptedPrivateKeyRecord, LocalKeyMaterial, UserId},
};

/// Lifecycle state of the user's messaging identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    /// No key record exists anywhere for this user.
    Unregistered,
    /// A directory record exists but the secret key is not in memory.
    Locked,
    /// The secret key is available for session derivation.
    Unlocked,
}

/// Manages the identity keypair for one authenticated user.
pub struct Keyring<D, S> {
    directory: D,
    store: S,
    user_id: UserId,
    kdf_params: KdfParameters,
    unlocked: Option<LocalKeyMaterial>,
}

impl<D: KeyDirectory, S: SecureStore> Keyring<D, S> {
    /// Create a keyring for the currently authenticated user.
    ///
    /// `kdf_params` applies to new registrations; unlock always follows the
    /// parameters recorded in the fetched record.
    pub fn new(directory: D, store: S, user_id: UserId, kdf_params: KdfParameters) -> Self {
        Self { directory, store, user_id, kdf_params, unlocked: None }
    }

    /// The user this keyring is bound to.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Whether the secret key is currently available.
    pub fn is_unlocked(&self) -> bool {
        self.unlocked.is_some()
    }

    /// Current lifecycle state. Queries the directory to distinguish
    /// `Unregistered` from `Locked`.
    pub async fn state(&self) -> Result<KeyState, EngineError> {
        if self.unlocked.is_some() {
            return Ok(KeyState::Unlocked);
        }
        let registered = self.directory.fetch_record(self.user_id).await?.is_some();
        Ok(if registered { KeyState::Locked } else { KeyState::Unregistered })
    }

    /// Unlocked key material.
    ///
    /// # Errors
    ///
    /// [`EngineError::Locked`] when no unlock has happened.
    pub fn key_material(&self) -> Result<&LocalKeyMaterial, EngineError> {
        self.unlocked.as_ref().ok_or(EngineError::Locked)
    }

    /// Public key of the unlocked identity.
    pub fn public_key(&self) -> Result<PublicKey, EngineError> {
        Ok(self.key_material()?.secret_key.public_key())
    }

    /// Generate and register a new identity, sealed under `password`.
    ///
    /// One-time per user: a second registration fails with
    /// [`EngineError::Conflict`] and changes nothing. On success the raw
    /// secret key is persisted locally and the keyring is `Unlocked`.
    pub async fn register<R: RngCore + CryptoRng>(
        &mut self,
        password: &[u8],
        rng: &mut R,
    ) -> Result<(), EngineError> {
        let pair = KeyPair::generate(rng);

        let mut salt = [0u8; SALT_SIZE];
        rng.fill_bytes(&mut salt);
        let master_key = derive_key_from_password(password, &salt, &self.kdf_params)?;

        let mut nonce = [0u8; NONCE_SIZE];
        rng.fill_bytes(&mut nonce);
        let sealed = seal_secret_key(&pair.secret, &master_key, &nonce);

        let record = EncryptedPrivateKeyRecord {
            public_key: pair.public,
            encrypted_private_key: sealed,
            private_key_nonce: nonce,
            kdf_salt: salt,
            kdf_params: self.kdf_params,
        };
        self.directory.publish(self.user_id, record).await?;

        let material =
            LocalKeyMaterial { secret_key: pair.secret, bound_user_id: self.user_id };
        self.store.save(&material)?;
        self.unlocked = Some(material);

        tracing::debug!(user_id = %self.user_id, "registered new messaging identity");
        Ok(())
    }

    /// Recover the identity from the directory record using `password`.
    ///
    /// This is how a second device, or a device that lost local storage,
    /// obtains the same identity.
    ///
    /// # Errors
    ///
    /// A missing record, a wrong password, and a corrupted record all
    /// surface as [`EngineError::Authentication`]: the unlock path must not
    /// reveal whether the user exists. Directory unavailability propagates
    /// separately (it is retryable, not a credential failure).
    pub async fn unlock(&mut self, password: &[u8]) -> Result<(), EngineError> {
        let Some(record) = self.directory.fetch_record(self.user_id).await? else {
            return Err(EngineError::Authentication);
        };

        let master_key =
            derive_key_from_password(password, &record.kdf_salt, &record.kdf_params)
                .map_err(|_| EngineError::Authentication)?;
        let secret = open_secret_key(
            &record.encrypted_private_key,
            &record.private_key_nonce,
            &master_key,
        )
        .map_err(|_| EngineError::Authentication)?;

        // Persist only after the envelope opened: an interrupted or failed
        // unlock leaves existing local material untouched.
        let material = LocalKeyMaterial { secret_key: secret, bound_user_id: self.user_id };
        self.store.save(&material)?;
        self.unlocked = Some(material);

        tracing::debug!(user_id = %self.user_id, "unlocked identity from directory record");
        Ok(())
    }

    /// Unlock from local secure storage without a password.
    ///
    /// Returns `true` on success. Material bound to a different user is
    /// wiped (it belongs to another identity) and `false` is returned so the
    /// caller can fall back to [`unlock`](Self::unlock) or
    /// [`register`](Self::register).
    pub fn auto_unlock(&mut self) -> Result<bool, EngineError> {
        match self.store.load()? {
            Some(material) if material.bound_user_id == self.user_id => {
                self.unlocked = Some(material);
                Ok(true)
            },
            Some(material) => {
                tracing::warn!(
                    bound = %material.bound_user_id,
                    current = %self.user_id,
                    "wiping key material bound to a different user"
                );
                self.store.clear()?;
                Ok(false)
            },
            None => Ok(false),
        }
    }

    /// Drop the in-memory secret key.
    ///
    /// Local storage keeps the material, so the same user auto-unlocks on
    /// the next launch without re-entering the password.
    pub fn lock(&mut self) {
        self.unlocked = None;
    }

    /// Logout: drop the in-memory key and remove the local material.
    pub fn clear_local(&mut self) -> Result<(), EngineError> {
        self.unlocked = None;
        self.store.clear()?;
        Ok(())
    }
}
