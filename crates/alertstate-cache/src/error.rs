//! Error types for the state cache.
//!
//! Only lookups surface an error to callers. Template and fingerprint
//! failures are recovered inside the cache with a logged fallback.

use alertstate_types::CacheId;

/// Errors returned by [`StateCache`](crate::StateCache) operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// No entry exists for the requested `(org, rule, instance)` triple.
    #[error("no entry for {rule_uid}:{cache_id} was found")]
    NotFound {
        /// The rule that was searched.
        rule_uid: String,
        /// The instance fingerprint that was searched.
        cache_id: CacheId,
    },
}
