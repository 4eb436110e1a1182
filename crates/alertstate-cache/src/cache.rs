//! The alert instance state cache.
//!
//! [`StateCache`] owns a three-level table, `org -> rule UID -> CacheId ->
//! AlertState`, behind a single reader-writer lock. Reads return owned
//! snapshots; nothing handed out aliases the stored entries.
//!
//! # Reconciliation
//!
//! [`StateCache::reconcile`] resolves the final label set for a result,
//! fingerprints it, and then either:
//!
//! - **updates** the existing entry's annotations (carrying internal
//!   annotations forward), leaving every other field untouched, or
//! - **creates** a new entry, with `starts_at` set to the evaluation time
//!   only if the result is alerting.
//!
//! A fingerprint failure is logged and the empty [`CacheId`] is used.
//! Instances that hit this path share one slot per rule.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use alertstate_types::{
    AlertRule, AlertState, CacheId, EvalResult, EvalState, OrgId, fingerprint,
};
use tracing::{debug, error};

use crate::error::CacheError;
use crate::labels::{LabelExpander, attach_rule_labels, carry_internal_annotations, final_labels};
use crate::metrics::{MetricsSink, MetricsSnapshot};
use crate::template::TemplateResolver;

type RuleStates = HashMap<CacheId, AlertState>;
type OrgRules = HashMap<String, RuleStates>;
type Table = HashMap<OrgId, OrgRules>;

/// Concurrent cache of tracked alert instance state.
pub struct StateCache {
    states: RwLock<Table>,
    expander: LabelExpander,
    metrics: Arc<dyn MetricsSink>,
    /// Orgs whose rule gauge was last emitted non-zero.
    reported_orgs: Mutex<BTreeSet<OrgId>>,
}

impl StateCache {
    /// Create an empty cache.
    pub fn new(
        resolver: Arc<dyn TemplateResolver>,
        metrics: Arc<dyn MetricsSink>,
        external_url: Option<String>,
    ) -> Self {
        Self {
            states: RwLock::new(HashMap::new()),
            expander: LabelExpander::new(resolver, external_url),
            metrics,
            reported_orgs: Mutex::new(BTreeSet::new()),
        }
    }

    // Every write leaves the table structurally valid; poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, Table> {
        self.states.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Table> {
        self.states.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create or update the tracked state for one evaluated instance.
    ///
    /// Returns a copy of the entry as stored after the call.
    pub fn reconcile(&self, rule: &AlertRule, result: &EvalResult) -> AlertState {
        let mut table = self.write();

        let mut context_labels = result.instance.clone();
        attach_rule_labels(&mut context_labels, rule);
        let expanded = self.expander.expand(rule, &context_labels, result);

        let labels = final_labels(rule, &expanded.labels, &result.instance);
        let cache_id = fingerprint(&labels).unwrap_or_else(|e| {
            error!(
                org_id = %rule.org_id,
                rule_uid = %rule.uid,
                error = %e,
                "error getting cacheId for entry"
            );
            CacheId::default()
        });

        let rule_states = table
            .entry(rule.org_id)
            .or_default()
            .entry(rule.uid.clone())
            .or_default();

        let mut annotations = expanded.annotations;
        if let Some(existing) = rule_states.get_mut(&cache_id) {
            carry_internal_annotations(&existing.annotations, &mut annotations);
            existing.annotations = annotations;
            return existing.clone();
        }

        // Without history, the first alerting evaluation is the best start time.
        let starts_at = (result.state == EvalState::Alerting).then_some(result.evaluated_at);
        let state = AlertState {
            org_id: rule.org_id,
            alert_rule_uid: rule.uid.clone(),
            cache_id: cache_id.clone(),
            labels,
            annotations,
            state: EvalState::Normal,
            evaluation_duration: result.evaluation_duration,
            starts_at,
            last_evaluation_time: None,
        };
        debug!(
            org_id = %rule.org_id,
            rule_uid = %rule.uid,
            cache_id = %cache_id,
            "tracking new alert instance"
        );
        rule_states.insert(cache_id, state.clone());
        state
    }

    /// Insert or overwrite the entry at the state's own key, verbatim.
    pub fn upsert(&self, state: AlertState) {
        let mut table = self.write();
        table
            .entry(state.org_id)
            .or_default()
            .entry(state.alert_rule_uid.clone())
            .or_default()
            .insert(state.cache_id.clone(), state);
    }

    /// Fetch one entry.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::NotFound`] if no entry exists at the key.
    pub fn lookup(
        &self,
        org_id: OrgId,
        rule_uid: &str,
        cache_id: &CacheId,
    ) -> Result<AlertState, CacheError> {
        let table = self.read();
        table
            .get(&org_id)
            .and_then(|rules| rules.get(rule_uid))
            .and_then(|states| states.get(cache_id))
            .cloned()
            .ok_or_else(|| CacheError::NotFound {
                rule_uid: rule_uid.to_owned(),
                cache_id: cache_id.clone(),
            })
    }

    /// Every entry across every rule of `org_id`, in no particular order.
    pub fn list_all(&self, org_id: OrgId) -> Vec<AlertState> {
        let table = self.read();
        table
            .get(&org_id)
            .map(|rules| rules.values().flat_map(HashMap::values).cloned().collect())
            .unwrap_or_default()
    }

    /// Every entry of one rule, in no particular order.
    pub fn list_for_rule(&self, org_id: OrgId, rule_uid: &str) -> Vec<AlertState> {
        let table = self.read();
        table
            .get(&org_id)
            .and_then(|rules| rules.get(rule_uid))
            .map(|states| states.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Remove every entry of one rule. Returns how many were removed.
    pub fn remove_rule(&self, org_id: OrgId, rule_uid: &str) -> usize {
        let mut table = self.write();
        table
            .get_mut(&org_id)
            .and_then(|rules| rules.remove(rule_uid))
            .map_or(0, |states| states.len())
    }

    /// Remove a single entry. Returns whether it existed.
    pub fn remove_entry(&self, org_id: OrgId, rule_uid: &str, cache_id: &CacheId) -> bool {
        let mut table = self.write();
        table
            .get_mut(&org_id)
            .and_then(|rules| rules.get_mut(rule_uid))
            .and_then(|states| states.remove(cache_id))
            .is_some()
    }

    /// Empty the whole cache.
    pub fn clear(&self) {
        let mut table = self.write();
        table.clear();
    }

    /// Count the cache contents and push the gauges to the metrics sink.
    ///
    /// An org that has left the table since the previous call is reported
    /// once with a rule count of `0`.
    pub fn record_metrics(&self) -> MetricsSnapshot {
        let mut snapshot = {
            let table = self.read();
            MetricsSnapshot::collect(&table)
        };

        let mut reported = self
            .reported_orgs
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for org in reported.iter() {
            snapshot.rules_per_org.entry(*org).or_insert(0);
        }
        *reported = snapshot
            .rules_per_org
            .iter()
            .filter(|(_, rules)| **rules > 0)
            .map(|(org, _)| *org)
            .collect();

        snapshot.emit(self.metrics.as_ref());
        snapshot
    }
}
