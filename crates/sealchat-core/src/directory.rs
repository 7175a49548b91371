//! Key directory abstraction.
//!
//! The directory is the server-side store of [`EncryptedPrivateKeyRecord`]s:
//! write-once per user, readable by anyone (the record is useless without
//! the password). Public keys are served separately so a counterpart's
//! session setup never touches their private material.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use sealchat_crypto::PublicKey;
use thiserror::Error;

use crate::types::{EncryptedPrivateKeyRecord, UserId};

/// Errors from the key directory.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// A record already exists for this user; records are write-once.
    #[error("record already exists")]
    Conflict,

    /// Directory unreachable or failing.
    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

/// Server-side key record store.
///
/// Records are write-once: a second `publish` for the same user fails with
/// [`DirectoryError::Conflict`] and never overwrites. Lookups return `None`
/// for unknown users; how that is surfaced to humans is the caller's concern
/// (the unlock path deliberately does not distinguish it from a wrong
/// password).
#[async_trait]
pub trait KeyDirectory: Send + Sync + 'static {
    /// Publish a new user's encrypted key record.
    async fn publish(
        &self,
        user_id: UserId,
        record: EncryptedPrivateKeyRecord,
    ) -> Result<(), DirectoryError>;

    /// Fetch the full encrypted key record for a user.
    async fn fetch_record(
        &self,
        user_id: UserId,
    ) -> Result<Option<EncryptedPrivateKeyRecord>, DirectoryError>;

    /// Fetch only the public key for a user (session establishment with a
    /// counterpart).
    async fn fetch_public_key(&self, user_id: UserId) -> Result<Option<PublicKey>, DirectoryError>;
}

/// In-memory directory for tests and simulation.
///
/// Clones share state through an `Arc`, so one instance can serve several
/// simulated devices.
///
/// # Panics
///
/// Panics if the internal mutex is poisoned (a thread panicked while holding
/// the lock). This is acceptable for test/simulation code.
#[derive(Clone, Default)]
pub struct MemoryDirectory {
    records: Arc<Mutex<HashMap<UserId, EncryptedPrivateKeyRecord>>>,
}

impl MemoryDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered users.
    #[allow(clippy::expect_used)]
    pub fn record_count(&self) -> usize {
        self.records.lock().expect("Mutex poisoned").len()
    }
}

#[async_trait]
impl KeyDirectory for MemoryDirectory {
    #[allow(clippy::expect_used)]
    async fn publish(
        &self,
        user_id: UserId,
        record: EncryptedPrivateKeyRecord,
    ) -> Result<(), DirectoryError> {
        let mut records = self.records.lock().expect("Mutex poisoned");
        if records.contains_key(&user_id) {
            return Err(DirectoryError::Conflict);
        }
        records.insert(user_id, record);
        Ok(())
    }

    #[allow(clippy::expect_used)]
    async fn fetch_record(
        &self,
        user_id: UserId,
    ) -> Result<Option<EncryptedPrivateKeyRecord>, DirectoryError> {
        Ok(self.records.lock().expect("Mutex poisoned").get(&user_id).cloned())
    }

    #[allow(clippy::expect_used)]
    async fn fetch_public_key(&self, user_id: UserId) -> Result<Option<PublicKey>, DirectoryError> {
        Ok(self
            .records
            .lock()
            .expect("Mutex poisoned")
            .get(&user_id)
            .map(|record| record.public_key))
    }
}
