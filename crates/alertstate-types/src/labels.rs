//! Label maps, reserved label names, internal annotations, and the
//! fingerprint that turns a final label set into a [`CacheId`].
//!
//! # Fingerprint format
//!
//! The fingerprint is the JSON encoding of the label set as an array of
//! `[name, value]` pairs ordered by name:
//!
//! ```text
//! [["__alert_rule_uid__","r1"],["alertname","cpu high"],["host","a"]]
//! ```
//!
//! Because [`Labels`] is ordered, the encoding is a pure function of the
//! set's contents.

use std::collections::BTreeMap;

use crate::ids::CacheId;

/// A label or annotation set: unique names mapped to values.
pub type Labels = BTreeMap<String, String>;

/// Reserved label carrying the owning rule's unique identifier.
pub const RULE_UID_LABEL: &str = "__alert_rule_uid__";

/// Reserved label carrying the rule's namespace (folder) identifier.
pub const NAMESPACE_UID_LABEL: &str = "__alert_rule_namespace_uid__";

/// Reserved label carrying the rule's display title.
pub const ALERT_NAME_LABEL: &str = "alertname";

/// Annotations whose previous value survives a cycle that does not set them.
pub const INTERNAL_ANNOTATIONS: [&str; 2] = ["__alertScreenshotToken__", "__alertImageToken__"];

/// Whether `name` is one of the [`INTERNAL_ANNOTATIONS`].
pub fn is_internal_annotation(name: &str) -> bool {
    INTERNAL_ANNOTATIONS.contains(&name)
}

/// Failure to encode a label set into a fingerprint.
#[derive(Debug, thiserror::Error)]
#[error("failed to fingerprint label set: {source}")]
pub struct FingerprintError {
    /// The underlying encoding error.
    #[from]
    source: serde_json::Error,
}

/// Derive the [`CacheId`] for a final, fully-resolved label set.
///
/// # Errors
///
/// Returns [`FingerprintError`] if the pairs cannot be encoded.
pub fn fingerprint(labels: &Labels) -> Result<CacheId, FingerprintError> {
    let pairs: Vec<(&str, &str)> = labels
        .iter()
        .map(|(name, value)| (name.as_str(), value.as_str()))
        .collect();
    let encoded = serde_json::to_string(&pairs)?;
    Ok(CacheId(encoded))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> Labels {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn fingerprint_is_ordered_pair_array() {
        let id = fingerprint(&labels(&[("host", "a"), ("alertname", "cpu high")]));
        assert_eq!(
            id.map(CacheId::into_inner).unwrap_or_default(),
            r#"[["alertname","cpu high"],["host","a"]]"#
        );
    }

    #[test]
    fn fingerprint_ignores_insertion_order() {
        let a = fingerprint(&labels(&[("x", "1"), ("y", "2")])).ok();
        let b = fingerprint(&labels(&[("y", "2"), ("x", "1")])).ok();
        assert!(a.is_some());
        assert_eq!(a, b);
    }

    #[test]
    fn fingerprint_distinguishes_values() {
        let a = fingerprint(&labels(&[("host", "a")])).ok();
        let b = fingerprint(&labels(&[("host", "b")])).ok();
        assert_ne!(a, b);
    }

    #[test]
    fn fingerprint_escapes_separators() {
        // A naive "k=v,k=v" join would make these two collide.
        let a = fingerprint(&labels(&[("a", "1,b=2")])).ok();
        let b = fingerprint(&labels(&[("a", "1"), ("b", "2")])).ok();
        assert_ne!(a, b);
    }

    #[test]
    fn internal_annotation_membership() {
        assert!(is_internal_annotation("__alertScreenshotToken__"));
        assert!(is_internal_annotation("__alertImageToken__"));
        assert!(!is_internal_annotation("summary"));
    }
}
