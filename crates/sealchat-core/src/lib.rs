//! Sealchat Core
//!
//! The messaging core: key lifecycle management, session key derivation,
//! message sealing with counter discipline, and history reconciliation.
//! Network and storage collaborators are trait seams ([`KeyDirectory`],
//! [`SecureStore`], [`MessageTransport`]) with in-memory implementations
//! for tests and simulation.
//!
//! # Key Lifecycle
//!
//! ```text
//! ┌──────────────┐  register   ┌────────┐  unlock / auto-unlock  ┌──────────┐
//! │ Unregistered │────────────>│ Locked │───────────────────────>│ Unlocked │
//! └──────────────┘             └────────┘<───────────────────────└──────────┘
//!                                              lock / user mismatch
//! ```
//!
//! There is no transition back to `Unregistered`: once the directory holds an
//! encrypted key record for a user, registration is permanent.
//!
//! # Nonce Discipline
//!
//! Every outbound message is sealed under the session key with a nonce built
//! from a random prefix and the sender's monotonic send counter. The counter
//! is advanced inside [`ChatSession`] as a single read-increment-seal step,
//! and reseeded from the append-only message log after history loads, so the
//! no-repeat-nonce invariant survives reinstalls and lost local state.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod directory;
pub mod error;
pub mod history;
pub mod keyring;
pub mod secure_store;
pub mod session;
pub mod transport;
pub mod types;

pub use config::EngineConfig;
pub use directory::{DirectoryError, KeyDirectory, MemoryDirectory};
pub use error::EngineError;
pub use history::{PageOutcome, reconcile_page};
pub use keyring::{KeyState, Keyring};
pub use secure_store::{MemorySecureStore, SecureStore, StoreError};
pub use session::{ChatSession, DecryptFailure, DecryptOutcome};
pub use transport::{
    HistoryCursor, HistoryPage, MemoryTransport, MessageTransport, TransportError,
};
pub use types::{
    ChatId, ChatMessage, DecryptedMessage, EncryptedPrivateKeyRecord, LocalKeyMaterial,
    OutboundEnvelope, UserId,
};
