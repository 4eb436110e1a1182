//! REST API endpoint handlers for the Observer server.
//!
//! Every handler makes one synchronous call into the [`StateCache`]; the
//! cache only ever blocks briefly on its lock.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/health` | Liveness probe |
//! | `GET` | `/metrics` | Prometheus exposition |
//! | `POST` | `/api/evaluations` | Reconcile one evaluation result |
//! | `PUT` | `/api/states` | Store a state verbatim |
//! | `DELETE` | `/api/states` | Clear the whole cache |
//! | `GET` | `/api/orgs/{org_id}/states` | All states of an org |
//! | `GET` | `/api/orgs/{org_id}/rules/{rule_uid}/states` | All states of a rule |
//! | `DELETE` | `/api/orgs/{org_id}/rules/{rule_uid}` | Remove a rule's states |
//! | `GET` | `/api/orgs/{org_id}/rules/{rule_uid}/states/{cache_id}` | One state |
//! | `DELETE` | `/api/orgs/{org_id}/rules/{rule_uid}/states/{cache_id}` | Remove one state |
//!
//! [`StateCache`]: alertstate_cache::StateCache

use std::sync::Arc;

use alertstate_types::{AlertRule, AlertState, CacheId, EvalResult, OrgId};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::info;

use crate::error::ObserverError;
use crate::state::AppState;

/// Request body for `POST /api/evaluations`.
#[derive(Debug, serde::Deserialize)]
pub struct EvaluationRequest {
    /// The rule that was evaluated.
    pub rule: AlertRule,
    /// The evaluated instance.
    pub result: EvalResult,
}

fn states_body(states: &[AlertState]) -> serde_json::Value {
    serde_json::json!({
        "count": states.len(),
        "states": states,
    })
}

/// `GET /health` -- liveness probe.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// `GET /metrics` -- Prometheus text exposition of the cache gauges.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Result<String, ObserverError> {
    let handle = state
        .prometheus
        .as_ref()
        .ok_or_else(|| ObserverError::MetricsUnavailable("no recorder installed".to_owned()))?;
    state.cache.record_metrics();
    Ok(handle.render())
}

/// `POST /api/evaluations` -- reconcile one evaluation result.
pub async fn reconcile(
    State(state): State<Arc<AppState>>,
    Json(request): Json<EvaluationRequest>,
) -> Result<impl IntoResponse, ObserverError> {
    if request.rule.uid.is_empty() {
        return Err(ObserverError::InvalidRequest("rule uid must not be empty".to_owned()));
    }
    let stored = state.cache.reconcile(&request.rule, &request.result);
    Ok(Json(stored))
}

/// `PUT /api/states` -- store a state at its own key, verbatim.
pub async fn upsert(
    State(state): State<Arc<AppState>>,
    Json(entry): Json<AlertState>,
) -> impl IntoResponse {
    state.cache.upsert(entry);
    StatusCode::NO_CONTENT
}

/// `DELETE /api/states` -- drop every cached state.
pub async fn clear(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.cache.clear();
    info!("state cache cleared");
    StatusCode::NO_CONTENT
}

/// `GET /api/orgs/{org_id}/states` -- every state of an organization.
pub async fn list_org_states(
    State(state): State<Arc<AppState>>,
    Path(org_id): Path<OrgId>,
) -> impl IntoResponse {
    let states = state.cache.list_all(org_id);
    Json(states_body(&states))
}

/// `GET /api/orgs/{org_id}/rules/{rule_uid}/states` -- every state of a rule.
pub async fn list_rule_states(
    State(state): State<Arc<AppState>>,
    Path((org_id, rule_uid)): Path<(OrgId, String)>,
) -> impl IntoResponse {
    let states = state.cache.list_for_rule(org_id, &rule_uid);
    Json(states_body(&states))
}

/// `DELETE /api/orgs/{org_id}/rules/{rule_uid}` -- remove a rule's states.
pub async fn remove_rule(
    State(state): State<Arc<AppState>>,
    Path((org_id, rule_uid)): Path<(OrgId, String)>,
) -> impl IntoResponse {
    let removed = state.cache.remove_rule(org_id, &rule_uid);
    info!(org_id = %org_id, rule_uid = %rule_uid, removed, "removed rule states");
    Json(serde_json::json!({ "removed": removed }))
}

/// `GET /api/orgs/{org_id}/rules/{rule_uid}/states/{cache_id}` -- one state.
pub async fn get_state(
    State(state): State<Arc<AppState>>,
    Path((org_id, rule_uid, cache_id)): Path<(OrgId, String, CacheId)>,
) -> Result<impl IntoResponse, ObserverError> {
    let entry = state
        .cache
        .lookup(org_id, &rule_uid, &cache_id)?;
    Ok(Json(entry))
}

/// `DELETE /api/orgs/{org_id}/rules/{rule_uid}/states/{cache_id}` -- remove one state.
pub async fn remove_state(
    State(state): State<Arc<AppState>>,
    Path((org_id, rule_uid, cache_id)): Path<(OrgId, String, CacheId)>,
) -> Result<impl IntoResponse, ObserverError> {
    if state.cache.remove_entry(org_id, &rule_uid, &cache_id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ObserverError::Cache(alertstate_cache::CacheError::NotFound {
            rule_uid,
            cache_id,
        }))
    }
}
