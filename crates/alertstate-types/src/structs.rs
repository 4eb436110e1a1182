//! Rules, evaluation results, and the per-instance state the cache tracks.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::EvalState;
use crate::ids::{CacheId, OrgId};
use crate::labels::Labels;

// ---------------------------------------------------------------------------
// Inputs from the evaluation loop
// ---------------------------------------------------------------------------

/// The parts of an alert rule definition the cache consumes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AlertRule {
    /// Owning organization.
    pub org_id: OrgId,
    /// Unique rule identifier.
    pub uid: String,
    /// Unique identifier of the namespace (folder) holding the rule.
    pub namespace_uid: String,
    /// Display title, exposed as the `alertname` label.
    pub title: String,
    /// Label templates, name to template text.
    #[serde(default)]
    pub labels: Labels,
    /// Annotation templates, name to template text.
    #[serde(default)]
    pub annotations: Labels,
}

/// One evaluated instance as produced by the evaluation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalResult {
    /// Labels identifying the evaluated series.
    #[serde(default)]
    pub instance: Labels,
    /// State the instance evaluated to.
    pub state: EvalState,
    /// When the evaluation ran.
    pub evaluated_at: DateTime<Utc>,
    /// How long the evaluation took.
    #[serde(default)]
    pub evaluation_duration: Duration,
    /// Named numeric captures from the query, exposed to templates.
    #[serde(default)]
    pub values: BTreeMap<String, Option<f64>>,
    /// Evaluation error message, set when `state` is [`EvalState::Error`].
    #[serde(default)]
    pub error: Option<String>,
}

impl EvalResult {
    /// Create a result with no value captures and no error.
    pub const fn new(instance: Labels, state: EvalState, evaluated_at: DateTime<Utc>) -> Self {
        Self {
            instance,
            state,
            evaluated_at,
            evaluation_duration: Duration::ZERO,
            values: BTreeMap::new(),
            error: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tracked state
// ---------------------------------------------------------------------------

/// Tracked condition of one alert instance across evaluation cycles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertState {
    /// Owning organization.
    pub org_id: OrgId,
    /// Owning rule.
    pub alert_rule_uid: String,
    /// Fingerprint of `labels`.
    pub cache_id: CacheId,
    /// Final merged label set.
    pub labels: Labels,
    /// Final expanded annotation set.
    pub annotations: Labels,
    /// Current evaluation state.
    #[serde(default)]
    pub state: EvalState,
    /// Duration of the evaluation that created this entry.
    #[serde(default)]
    pub evaluation_duration: Duration,
    /// When the instance was first seen alerting. Never reset while the
    /// entry exists.
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    /// Last evaluation time, maintained by the state manager.
    #[serde(default)]
    pub last_evaluation_time: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eval_result_deserializes_with_defaults() {
        let json = r#"{
            "instance": {"host": "a"},
            "state": "Alerting",
            "evaluated_at": "2024-01-01T00:00:00Z"
        }"#;
        let result: Option<EvalResult> = serde_json::from_str(json).ok();
        let result = result.unwrap_or_else(|| EvalResult::new(Labels::new(), EvalState::Normal, Utc::now()));
        assert_eq!(result.state, EvalState::Alerting);
        assert_eq!(result.instance.get("host").map(String::as_str), Some("a"));
        assert_eq!(result.evaluation_duration, Duration::ZERO);
        assert!(result.values.is_empty());
        assert!(result.error.is_none());
    }

    #[test]
    fn rule_templates_default_to_empty() {
        let json = r#"{"org_id": 1, "uid": "r1", "namespace_uid": "ns", "title": "t"}"#;
        let rule: AlertRule = serde_json::from_str(json).unwrap_or_default();
        assert_eq!(rule.uid, "r1");
        assert_eq!(rule.org_id, OrgId(1));
        assert!(rule.labels.is_empty());
        assert!(rule.annotations.is_empty());
    }
}
