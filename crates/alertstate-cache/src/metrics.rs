//! Gauges derived from the cache contents.
//!
//! A snapshot reports, for each organization, the number of rules with at
//! least one cached instance, and for each of the five evaluation states the
//! number of cached instances in that state. Every state is always reported,
//! so a state whose last instance disappears drops to zero instead of
//! keeping its previous value.

use std::collections::{BTreeMap, HashMap};

use alertstate_types::{AlertState, CacheId, EvalState, OrgId};
use metrics::{describe_gauge, gauge};

// ============================================================================
// Gauge names
// ============================================================================

/// Number of rules with cached instances, labelled by `org`.
pub const RULE_GROUP_RULES: &str = "alertstate_rule_group_rules";

/// Number of cached instances, labelled by lower-cased `state`.
pub const ALERTS: &str = "alertstate_alerts";

/// Registers all gauge descriptions.
///
/// Call this once at startup after installing a metrics recorder.
pub fn register_metrics() {
    describe_gauge!(RULE_GROUP_RULES, "The number of alert rules that have cached instances.");
    describe_gauge!(ALERTS, "How many alert instances are in each evaluation state.");
}

// ============================================================================
// Sink contract
// ============================================================================

/// Destination for the gauges the cache reports.
pub trait MetricsSink: Send + Sync {
    /// Set the rule-count gauge for `org`.
    fn set_rule_group_count(&self, org: OrgId, rules: usize);

    /// Set the instance-count gauge for `state`.
    fn set_state_count(&self, state: EvalState, instances: usize);
}

/// [`MetricsSink`] that records through the `metrics` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrometheusSink;

impl MetricsSink for PrometheusSink {
    fn set_rule_group_count(&self, org: OrgId, rules: usize) {
        gauge!(RULE_GROUP_RULES, "org" => org.to_string()).set(as_gauge(rules));
    }

    fn set_state_count(&self, state: EvalState, instances: usize) {
        gauge!(ALERTS, "state" => state.as_str()).set(as_gauge(instances));
    }
}

/// [`MetricsSink`] that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl MetricsSink for NoopSink {
    fn set_rule_group_count(&self, _org: OrgId, _rules: usize) {}

    fn set_state_count(&self, _state: EvalState, _instances: usize) {}
}

/// Lossless conversion for any count that fits in `u32`; larger counts saturate.
fn as_gauge(n: usize) -> f64 {
    f64::from(u32::try_from(n).unwrap_or(u32::MAX))
}

// ============================================================================
// Snapshot
// ============================================================================

/// Instance counts for every evaluation state, zero included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateCounts {
    counts: BTreeMap<EvalState, usize>,
}

impl StateCounts {
    /// All five states at zero.
    pub fn new() -> Self {
        Self {
            counts: EvalState::ALL.iter().map(|s| (*s, 0)).collect(),
        }
    }

    /// Count one more instance in `state`.
    pub fn increment(&mut self, state: EvalState) {
        let n = self.counts.entry(state).or_insert(0);
        *n = n.saturating_add(1);
    }

    /// Count for `state`.
    pub fn get(&self, state: EvalState) -> usize {
        self.counts.get(&state).copied().unwrap_or(0)
    }

    /// Sum over all states.
    pub fn total(&self) -> usize {
        self.counts.values().fold(0, |acc, n| acc.saturating_add(*n))
    }

    /// Iterate `(state, count)` for every state.
    pub fn iter(&self) -> impl Iterator<Item = (EvalState, usize)> + '_ {
        self.counts.iter().map(|(s, n)| (*s, *n))
    }
}

impl Default for StateCounts {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time counts taken from the cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Rules with at least one cached instance, per organization.
    pub rules_per_org: BTreeMap<OrgId, usize>,
    /// Instance counts per state, per organization.
    pub states_per_org: BTreeMap<OrgId, StateCounts>,
    /// Instance counts per state across every organization.
    pub totals: StateCounts,
}

impl MetricsSnapshot {
    /// Count the contents of a nested org/rule/instance table.
    pub(crate) fn collect(
        table: &HashMap<OrgId, HashMap<String, HashMap<CacheId, AlertState>>>,
    ) -> Self {
        let mut snapshot = Self::default();
        for (org, rules) in table {
            let populated = rules.values().filter(|states| !states.is_empty()).count();
            snapshot.rules_per_org.insert(*org, populated);

            let org_counts = snapshot.states_per_org.entry(*org).or_default();
            for state in rules.values().flat_map(HashMap::values) {
                org_counts.increment(state.state);
                snapshot.totals.increment(state.state);
            }
        }
        snapshot
    }

    /// Push every gauge in this snapshot to `sink`.
    ///
    /// State gauges carry only the state name, so they report `totals`.
    pub fn emit(&self, sink: &dyn MetricsSink) {
        for (org, rules) in &self.rules_per_org {
            sink.set_rule_group_count(*org, *rules);
        }
        for (state, n) in self.totals.iter() {
            sink.set_state_count(state, n);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_counts_report_every_state_at_zero() {
        let counts = StateCounts::new();
        assert_eq!(counts.iter().count(), 5);
        assert!(counts.iter().all(|(_, n)| n == 0));
        assert_eq!(counts.total(), 0);
    }

    #[test]
    fn increment_and_total() {
        let mut counts = StateCounts::new();
        counts.increment(EvalState::Alerting);
        counts.increment(EvalState::Alerting);
        counts.increment(EvalState::NoData);
        assert_eq!(counts.get(EvalState::Alerting), 2);
        assert_eq!(counts.get(EvalState::NoData), 1);
        assert_eq!(counts.get(EvalState::Error), 0);
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn gauge_conversion_saturates() {
        assert!((as_gauge(7) - 7.0).abs() < f64::EPSILON);
        assert!((as_gauge(usize::MAX) - f64::from(u32::MAX)).abs() < f64::EPSILON);
    }
}
