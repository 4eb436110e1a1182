//! Final label and annotation resolution for one evaluated instance.
//!
//! Precedence, highest first:
//!
//! 1. Reserved rule labels (rule UID, namespace UID, `alertname`)
//! 2. Expanded rule label templates
//! 3. Instance labels from the evaluation result
//!
//! A template that fails to expand is logged and its literal text is used
//! as the value. Failure is per key and never aborts the caller.

use std::sync::Arc;

use alertstate_types::{
    ALERT_NAME_LABEL, AlertRule, EvalResult, Labels, NAMESPACE_UID_LABEL, RULE_UID_LABEL,
    is_internal_annotation,
};
use tracing::error;

use crate::template::{TemplateContext, TemplateResolver};

/// Expanded rule templates for one instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expanded {
    /// Expanded label templates.
    pub labels: Labels,
    /// Expanded annotation templates.
    pub annotations: Labels,
}

/// Expands a rule's label and annotation templates through a
/// [`TemplateResolver`].
#[derive(Clone)]
pub struct LabelExpander {
    resolver: Arc<dyn TemplateResolver>,
    external_url: Option<String>,
}

impl LabelExpander {
    /// Create an expander using `resolver`, exposing `external_url` to templates.
    pub fn new(resolver: Arc<dyn TemplateResolver>, external_url: Option<String>) -> Self {
        Self {
            resolver,
            external_url,
        }
    }

    /// Expand every label and annotation template of `rule`.
    ///
    /// `context_labels` are the instance labels with the reserved rule
    /// labels attached. Neither input map is modified.
    pub fn expand(&self, rule: &AlertRule, context_labels: &Labels, result: &EvalResult) -> Expanded {
        Expanded {
            labels: self.expand_map(rule, &rule.labels, context_labels, result),
            annotations: self.expand_map(rule, &rule.annotations, context_labels, result),
        }
    }

    fn expand_map(
        &self,
        rule: &AlertRule,
        templates: &Labels,
        context_labels: &Labels,
        result: &EvalResult,
    ) -> Labels {
        let mut expanded = Labels::new();
        for (key, text) in templates {
            let ctx = TemplateContext {
                rule_title: &rule.title,
                text,
                labels: context_labels,
                result,
                external_url: self.external_url.as_deref(),
            };
            let value = match self.resolver.resolve(&ctx) {
                Ok(value) => value,
                Err(e) => {
                    error!(
                        org_id = %rule.org_id,
                        rule_uid = %rule.uid,
                        key = %key,
                        template = %text,
                        error = %e,
                        "error in expanding template"
                    );
                    text.clone()
                }
            };
            expanded.insert(key.clone(), value);
        }
        expanded
    }
}

/// Set the reserved labels of `rule` on `labels`, overwriting any existing values.
pub fn attach_rule_labels(labels: &mut Labels, rule: &AlertRule) {
    labels.insert(RULE_UID_LABEL.to_owned(), rule.uid.clone());
    labels.insert(NAMESPACE_UID_LABEL.to_owned(), rule.namespace_uid.clone());
    labels.insert(ALERT_NAME_LABEL.to_owned(), rule.title.clone());
}

/// Union of `primary` and `secondary`; on a name collision `primary` wins.
pub fn merge_labels(primary: &Labels, secondary: &Labels) -> Labels {
    let mut merged = primary.clone();
    for (name, value) in secondary {
        merged
            .entry(name.clone())
            .or_insert_with(|| value.clone());
    }
    merged
}

/// Build the final label set from expanded rule labels and instance labels.
pub fn final_labels(rule: &AlertRule, expanded: &Labels, instance: &Labels) -> Labels {
    let mut labels = merge_labels(expanded, instance);
    attach_rule_labels(&mut labels, rule);
    labels
}

/// Copy internal annotations from `previous` into `next` where `next` does
/// not set them. Other annotations in `previous` are dropped.
pub fn carry_internal_annotations(previous: &Labels, next: &mut Labels) {
    for (name, value) in previous {
        if is_internal_annotation(name) && !next.contains_key(name) {
            next.insert(name.clone(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{MiniJinjaResolver, TemplateError};
    use alertstate_types::{EvalState, OrgId};
    use chrono::Utc;

    struct FailingResolver;

    impl TemplateResolver for FailingResolver {
        fn resolve(&self, ctx: &TemplateContext<'_>) -> Result<String, TemplateError> {
            if ctx.text.contains("bad") {
                Err(TemplateError {
                    rule_title: ctx.rule_title.to_owned(),
                    message: "boom".to_owned(),
                })
            } else {
                Ok(ctx.text.to_uppercase())
            }
        }
    }

    fn map(pairs: &[(&str, &str)]) -> Labels {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    fn rule() -> AlertRule {
        AlertRule {
            org_id: OrgId(1),
            uid: "r1".to_owned(),
            namespace_uid: "ns1".to_owned(),
            title: "cpu high".to_owned(),
            labels: map(&[("team", "{{ labels.host }}-ops")]),
            annotations: map(&[("summary", "{{ labels.alertname }} on {{ labels.host }}")]),
        }
    }

    #[test]
    fn reserved_labels_override_everything() {
        let instance = map(&[
            (RULE_UID_LABEL, "spoofed"),
            (ALERT_NAME_LABEL, "spoofed"),
            ("host", "a"),
        ]);
        let expanded = map(&[(NAMESPACE_UID_LABEL, "spoofed")]);
        let labels = final_labels(&rule(), &expanded, &instance);

        assert_eq!(labels.get(RULE_UID_LABEL).map(String::as_str), Some("r1"));
        assert_eq!(labels.get(NAMESPACE_UID_LABEL).map(String::as_str), Some("ns1"));
        assert_eq!(labels.get(ALERT_NAME_LABEL).map(String::as_str), Some("cpu high"));
        assert_eq!(labels.get("host").map(String::as_str), Some("a"));
    }

    #[test]
    fn rule_labels_win_over_instance_labels() {
        let merged = merge_labels(&map(&[("severity", "critical")]), &map(&[("severity", "low"), ("host", "a")]));
        assert_eq!(merged, map(&[("host", "a"), ("severity", "critical")]));
    }

    #[test]
    fn expansion_sees_reserved_labels_and_leaves_inputs_untouched() {
        let rule = rule();
        let instance = map(&[("host", "a")]);
        let mut context = instance.clone();
        attach_rule_labels(&mut context, &rule);
        let context_before = context.clone();
        let result = EvalResult::new(instance, EvalState::Alerting, Utc::now());

        let expander = LabelExpander::new(Arc::new(MiniJinjaResolver::new()), None);
        let expanded = expander.expand(&rule, &context, &result);

        assert_eq!(expanded.labels, map(&[("team", "a-ops")]));
        assert_eq!(expanded.annotations, map(&[("summary", "cpu high on a")]));
        assert_eq!(context, context_before);
        assert_eq!(result.instance, map(&[("host", "a")]));
    }

    #[test]
    fn failed_expansion_falls_back_to_literal_per_key() {
        let mut rule = rule();
        rule.labels = map(&[("ok", "fine"), ("broken", "bad {{")]);
        rule.annotations = map(&[("summary", "bad template")]);
        let result = EvalResult::new(Labels::new(), EvalState::Normal, Utc::now());

        let expander = LabelExpander::new(Arc::new(FailingResolver), None);
        let expanded = expander.expand(&rule, &Labels::new(), &result);

        assert_eq!(expanded.labels, map(&[("broken", "bad {{"), ("ok", "FINE")]));
        assert_eq!(expanded.annotations, map(&[("summary", "bad template")]));
    }

    #[test]
    fn internal_annotations_carry_over_unless_overridden() {
        let previous = map(&[
            ("__alertImageToken__", "old-image"),
            ("__alertScreenshotToken__", "old-shot"),
            ("summary", "old summary"),
        ]);
        let mut next = map(&[("__alertImageToken__", "new-image")]);
        carry_internal_annotations(&previous, &mut next);

        assert_eq!(
            next,
            map(&[
                ("__alertImageToken__", "new-image"),
                ("__alertScreenshotToken__", "old-shot"),
            ])
        );
    }
}
