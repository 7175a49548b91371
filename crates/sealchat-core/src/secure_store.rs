//! Local secure storage abstraction.
//!
//! Device-scoped persistence for [`LocalKeyMaterial`], with guaranteed
//! removal on explicit clear. The trait is synchronous: platform keystores
//! are local calls, and keeping it sync mirrors the storage seam used by the
//! rest of the workspace.

use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::types::LocalKeyMaterial;

/// Errors from local secure storage.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Underlying keystore unreachable or failing.
    #[error("secure store unavailable: {0}")]
    Unavailable(String),
}

/// Device-local secure key/value storage holding the bound key material.
///
/// Must be `Clone` (shared between the keyring and the engine), `Send +
/// Sync`, and synchronous. Implementations typically share internal state
/// via `Arc`, so clones access the same underlying storage.
pub trait SecureStore: Clone + Send + Sync + 'static {
    /// Load the stored key material, if any.
    fn load(&self) -> Result<Option<LocalKeyMaterial>, StoreError>;

    /// Store key material, replacing any previous value.
    fn save(&self, material: &LocalKeyMaterial) -> Result<(), StoreError>;

    /// Remove any stored key material.
    ///
    /// # Invariants
    ///
    /// - Post: `load()` returns `None` until the next `save`.
    fn clear(&self) -> Result<(), StoreError>;
}

/// In-memory secure store for tests and simulation.
///
/// # Panics
///
/// Panics if the internal mutex is poisoned (a thread panicked while holding
/// the lock). This is acceptable for test/simulation code.
#[derive(Clone, Default)]
pub struct MemorySecureStore {
    material: Arc<Mutex<Option<LocalKeyMaterial>>>,
}

impl MemorySecureStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SecureStore for MemorySecureStore {
    #[allow(clippy::expect_used)]
    fn load(&self) -> Result<Option<LocalKeyMaterial>, StoreError> {
        Ok(self.material.lock().expect("Mutex poisoned").clone())
    }

    #[allow(clippy::expect_used)]
    fn save(&self, material: &LocalKeyMaterial) -> Result<(), StoreError> {
        *self.material.lock().expect("Mutex poisoned") = Some(material.clone());
        Ok(())
    }

    #[allow(clippy::expect_used)]
    fn clear(&self) -> Result<(), StoreError> {
        *self.material.lock().expect("Mutex poisoned") = None;
        Ok(())
    }
}
