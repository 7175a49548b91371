//! History reconciliation.
//!
//! Merges batches of stored messages into the decrypted view and feeds the
//! send counter baseline back into the session. The append-only message log
//! is the source of truth for the counter; the in-memory value is only a
//! cache, which is what lets the no-repeat-nonce invariant survive
//! reinstalls and lost local storage.

use crate::{
    session::{ChatSession, DecryptFailure, DecryptOutcome},
    types::{ChatMessage, DecryptedMessage},
};

/// Result of reconciling one batch of stored messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageOutcome {
    /// Successfully decrypted messages, in the order they were given.
    pub decrypted: Vec<DecryptedMessage>,
    /// Messages skipped (foreign sender or failed authentication).
    pub dropped: usize,
    /// The counter floor applied to the session, if any own-sent counters
    /// were observed.
    pub reseeded_to: Option<u64>,
}

/// Decrypt a batch of stored messages and reseed the session counter.
///
/// Per-message behavior:
/// - a sender outside the session's participants is skipped, not queued
/// - a message that fails authentication is skipped; one corrupt message
///   never blocks the rest of the batch
///
/// Counter reseeding is all-or-nothing per batch: own-sent counters are
/// collected while scanning and applied once at the end, so a caller that
/// abandons a fetch mid-flight never leaves a partially applied baseline.
/// Own-sent counters count toward the baseline even when the message body
/// fails to decrypt: the counter is log metadata, and skipping it could
/// reuse the counter of a message this device once sent.
pub fn reconcile_page(session: &mut ChatSession, messages: &[ChatMessage]) -> PageOutcome {
    let mut decrypted = Vec::with_capacity(messages.len());
    let mut dropped = 0usize;
    let mut own_max: Option<u64> = None;

    for message in messages {
        if message.sender_id == session.local_user() {
            own_max =
                Some(own_max.map_or(message.message_counter, |m| m.max(message.message_counter)));
        }

        match session.open_from(message.sender_id, &message.encrypted_content, &message.nonce) {
            DecryptOutcome::Decrypted(plaintext) => decrypted.push(DecryptedMessage {
                chat_id: message.chat_id,
                sender_id: message.sender_id,
                plaintext,
                message_counter: message.message_counter,
                timestamp_ms: message.timestamp_ms,
            }),
            DecryptOutcome::Failed(reason @ DecryptFailure::ForeignSender { .. }) => {
                tracing::debug!(
                    chat_id = %message.chat_id,
                    ?reason,
                    "skipping message from non-participant"
                );
                dropped += 1;
            },
            DecryptOutcome::Failed(reason) => {
                tracing::warn!(
                    chat_id = %message.chat_id,
                    sender_id = %message.sender_id,
                    counter = message.message_counter,
                    ?reason,
                    "dropping undecryptable message"
                );
                dropped += 1;
            },
        }
    }

    let reseeded_to = own_max.map(|max| max + 1);
    if let Some(floor) = reseeded_to {
        session.reseed_counter(floor);
    }

    PageOutcome { decrypted, dropped, reseeded_to }
}
