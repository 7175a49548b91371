//! Engine configuration.

use sealchat_crypto::KdfParameters;

/// Default page size for cursor-paginated history fetches.
pub const DEFAULT_HISTORY_PAGE_SIZE: usize = 20;

/// Tunable engine parameters.
///
/// KDF parameters apply to new registrations only; unlock always uses the
/// parameters recorded in the fetched key record.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Messages per history page request.
    pub history_page_size: usize,
    /// KDF parameters for new registrations.
    pub kdf: KdfParameters,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_page_size: DEFAULT_HISTORY_PAGE_SIZE,
            kdf: KdfParameters::default(),
        }
    }
}
