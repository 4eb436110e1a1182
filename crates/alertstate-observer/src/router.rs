//! Axum router construction for the Observer API.

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router for the Observer server.
///
/// See [`handlers`] for the endpoint table.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .route("/api/evaluations", post(handlers::reconcile))
        .route("/api/states", delete(handlers::clear).put(handlers::upsert))
        .route("/api/orgs/{org_id}/states", get(handlers::list_org_states))
        .route("/api/orgs/{org_id}/rules/{rule_uid}", delete(handlers::remove_rule))
        .route(
            "/api/orgs/{org_id}/rules/{rule_uid}/states",
            get(handlers::list_rule_states),
        )
        .route(
            "/api/orgs/{org_id}/rules/{rule_uid}/states/{cache_id}",
            get(handlers::get_state).delete(handlers::remove_state),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
