//! Template expansion contract and the default `minijinja` resolver.
//!
//! Rule label and annotation values are templates rendered once per
//! evaluated instance. Templates see:
//!
//! | Variable | Content |
//! |----------|---------|
//! | `labels` | Instance labels plus the reserved rule labels |
//! | `values` | Named numeric captures (`null` when absent) |
//! | `value` | Human readable rendering of all captures |
//! | `error` | Evaluation error message, if any |
//! | `rule_title` | The rule's display title |
//! | `external_url` | Configured base URL, if any |

use std::fmt::Write as _;

use alertstate_types::{EvalResult, Labels};
use minijinja::{Environment, UndefinedBehavior, context};

/// Everything a resolver needs to expand one template value.
#[derive(Debug, Clone, Copy)]
pub struct TemplateContext<'a> {
    /// Display title of the rule being evaluated.
    pub rule_title: &'a str,
    /// Raw template text.
    pub text: &'a str,
    /// Instance labels augmented with the reserved rule labels.
    pub labels: &'a Labels,
    /// The evaluation result being reconciled.
    pub result: &'a EvalResult,
    /// Externally configured base URL.
    pub external_url: Option<&'a str>,
}

/// Failure to expand a template.
#[derive(Debug, thiserror::Error)]
#[error("template expansion failed for rule {rule_title:?}: {message}")]
pub struct TemplateError {
    /// Title of the rule whose template failed.
    pub rule_title: String,
    /// Engine error description.
    pub message: String,
}

/// Expands rule-level template text for one evaluated instance.
///
/// Implementations are called while the cache's write lock is held and
/// must therefore be fast and free of side effects.
pub trait TemplateResolver: Send + Sync {
    /// Expand `ctx.text`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] if the template cannot be parsed or rendered.
    fn resolve(&self, ctx: &TemplateContext<'_>) -> Result<String, TemplateError>;
}

/// [`TemplateResolver`] backed by a `minijinja` environment.
///
/// Undefined variables render as empty strings.
pub struct MiniJinjaResolver {
    env: Environment<'static>,
}

impl MiniJinjaResolver {
    /// Create a resolver with a lenient environment.
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Lenient);
        Self { env }
    }
}

impl Default for MiniJinjaResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateResolver for MiniJinjaResolver {
    fn resolve(&self, ctx: &TemplateContext<'_>) -> Result<String, TemplateError> {
        if !has_markup(ctx.text) {
            return Ok(ctx.text.to_owned());
        }

        let vars = context! {
            labels => ctx.labels,
            values => &ctx.result.values,
            value => render_values(ctx.result),
            error => &ctx.result.error,
            rule_title => ctx.rule_title,
            external_url => ctx.external_url,
        };

        self.env
            .render_str(ctx.text, vars)
            .map_err(|e| TemplateError {
                rule_title: ctx.rule_title.to_owned(),
                message: e.to_string(),
            })
    }
}

/// Whether `text` contains any template delimiters.
fn has_markup(text: &str) -> bool {
    text.contains("{{") || text.contains("{%") || text.contains("{#")
}

/// Render all value captures as `[ var='A' value=1 ], [ var='B' value=null ]`.
fn render_values(result: &EvalResult) -> String {
    let mut out = String::new();
    for (name, value) in &result.values {
        if !out.is_empty() {
            out.push_str(", ");
        }
        match value {
            Some(v) => {
                let _ = write!(out, "[ var='{name}' value={v} ]");
            }
            None => {
                let _ = write!(out, "[ var='{name}' value=null ]");
            }
        }
    }
    out
}
