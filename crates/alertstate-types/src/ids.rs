//! Identifier types for organizations and cached instances.
//!
//! Organizations are numbered tenants; instances are identified by the
//! fingerprint of their final label set (see [`crate::labels::fingerprint`]).

use serde::{Deserialize, Serialize};

/// Numeric identifier of a tenant organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrgId(pub i64);

impl OrgId {
    /// Return the inner numeric value.
    pub const fn into_inner(self) -> i64 {
        self.0
    }
}

impl core::fmt::Display for OrgId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for OrgId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Deterministic fingerprint of an instance's final label set.
///
/// Two results for the same rule whose labels resolve to the same final
/// set always produce equal identifiers. The empty identifier is the
/// fallback used when fingerprinting fails.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheId(pub String);

impl CacheId {
    /// Borrow the fingerprint text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return the owned fingerprint text.
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Whether this is the empty fallback fingerprint.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl core::fmt::Display for CacheId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for CacheId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for CacheId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn org_id_displays_as_bare_number() {
        assert_eq!(OrgId(42).to_string(), "42");
        assert_eq!(OrgId::from(-1).into_inner(), -1);
    }

    #[test]
    fn org_id_serializes_transparently() {
        let json = serde_json::to_string(&OrgId(7)).unwrap_or_default();
        assert_eq!(json, "7");
    }

    #[test]
    fn default_cache_id_is_empty_fallback() {
        assert!(CacheId::default().is_empty());
        assert!(!CacheId::from("[[\"a\",\"b\"]]").is_empty());
    }

    #[test]
    fn cache_id_text_round_trips() {
        let id = CacheId::from("[[\"host\",\"a\"]]");
        assert_eq!(id.as_str(), "[[\"host\",\"a\"]]");
        assert_eq!(id.to_string(), id.as_str());
        assert_eq!(id.into_inner(), "[[\"host\",\"a\"]]");
    }
}
