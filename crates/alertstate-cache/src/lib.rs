//! Concurrent in-memory cache of alert instance evaluation state.
//!
//! The evaluation loop hands every evaluated instance to
//! [`StateCache::reconcile`], which resolves the instance's final labels
//! and annotations, derives its [`CacheId`](alertstate_types::CacheId), and
//! either updates the tracked [`AlertState`](alertstate_types::AlertState)
//! or starts tracking a new one.
//!
//! # Modules
//!
//! - [`cache`] -- The three-level store (org, rule, instance) and reconciliation.
//! - [`labels`] -- Label/annotation merging and template expansion with fallback.
//! - [`template`] -- [`TemplateResolver`] contract and the `minijinja` resolver.
//! - [`metrics`] -- [`MetricsSink`] contract, snapshot counting, gauge recording.
//! - [`recorder`] -- Periodic metrics recording task.
//! - [`config`] -- YAML configuration for the cache and its host process.
//! - [`error`] -- Error types.
//!
//! # Locking
//!
//! One reader-writer lock guards the whole table. Mutations hold the write
//! lock for their full duration, template expansion included, so a given
//! `(org, rule, instance)` slot is never created twice concurrently.

pub mod cache;
pub mod config;
pub mod error;
pub mod labels;
pub mod metrics;
pub mod recorder;
pub mod template;

pub use cache::StateCache;
pub use config::{CacheConfig, ConfigError, ObserverConfig};
pub use error::CacheError;
pub use labels::{Expanded, LabelExpander};
pub use metrics::{MetricsSink, MetricsSnapshot, NoopSink, PrometheusSink, StateCounts};
pub use recorder::spawn_metrics_recorder;
pub use template::{MiniJinjaResolver, TemplateContext, TemplateError, TemplateResolver};
