//! Shared data model for the alert instance state cache.
//!
//! Every crate in the workspace speaks in these types: the evaluation loop
//! hands in an [`AlertRule`] and an [`EvalResult`], the cache stores one
//! [`AlertState`] per instance, and instances are keyed by the
//! [`CacheId`] fingerprint of their final label set.
//!
//! # Modules
//!
//! - [`ids`] -- Organization and instance identifiers
//! - [`enums`] -- The closed set of evaluation states
//! - [`labels`] -- Label maps, reserved names, and fingerprinting
//! - [`structs`] -- Rules, evaluation results, and tracked state

pub mod enums;
pub mod ids;
pub mod labels;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::EvalState;
pub use ids::{CacheId, OrgId};
pub use labels::{
    FingerprintError, INTERNAL_ANNOTATIONS, Labels, is_internal_annotation,
    ALERT_NAME_LABEL, NAMESPACE_UID_LABEL, RULE_UID_LABEL, fingerprint,
};
pub use structs::{AlertRule, AlertState, EvalResult};
