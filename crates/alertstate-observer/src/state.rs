//! Shared application state for the Observer API server.

use std::sync::Arc;

use alertstate_cache::StateCache;
use metrics_exporter_prometheus::PrometheusHandle;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// The state cache this server exposes.
    pub cache: Arc<StateCache>,
    /// Handle for rendering the Prometheus exposition, if a recorder is installed.
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    /// Create application state over `cache` with no metrics exposition.
    pub const fn new(cache: Arc<StateCache>) -> Self {
        Self {
            cache,
            prometheus: None,
        }
    }

    /// Attach a Prometheus handle for `GET /metrics`.
    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }
}
