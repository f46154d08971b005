//! Liveness endpoint for load balancers and uptime probes.
//!
//! Unauthenticated on purpose: probes run before any login flow exists.
//! The payload reports the service identity and whether the SQLite store
//! answers a trivial query, so a wedged database shows up as `degraded`
//! while the process itself still responds.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tracing::warn;
use utoipa::OpenApi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(get_health))]
pub struct HealthApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(get_health))
}

/// `GET /health`: service identity, version, and store reachability.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Liveness report", body = Value)
    )
)]
pub async fn get_health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let database = match state.store.ping().await {
        Ok(()) => "up",
        Err(e) => {
            warn!(error = %e, "health probe: database unreachable");
            "down"
        }
    };
    Json(json!({
        "status":   if database == "up" { "ok" } else { "degraded" },
        "service":  env!("CARGO_PKG_NAME"),
        "version":  env!("CARGO_PKG_VERSION"),
        "database": database,
    }))
}

// ── Tests ──────────────────────────────────────────────────────────────────────
