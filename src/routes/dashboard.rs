//! Personalized landing data.
//!
//! Uses the optional authorization mode: an anonymous caller still gets a
//! generic payload instead of a 401.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use utoipa::OpenApi;

use crate::auth::OptionalPrincipal;
use crate::entities::SessionStore;
use crate::error::ServerError;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(get_dashboard))]
pub struct DashboardApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/dashboard", get(get_dashboard))
}

/// Dashboard greeting (`GET /dashboard`).
///
/// Authenticated callers get their role and recent session count;
/// everyone else gets the generic payload.
#[utoipa::path(
    get,
    path = "/dashboard",
    tag = "dashboard",
    responses(
        (status = 200, description = "Dashboard payload", body = Value)
    )
)]
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    OptionalPrincipal(principal): OptionalPrincipal,
) -> Result<Json<Value>, ServerError> {
    match principal {
        Some(p) => {
            let sessions = state.store.list_sessions(p.id).await?;
            Ok(Json(json!({
                "greeting": format!("Welcome back, {}", p.email),
                "role": p.role,
                "session_count": sessions.len(),
            })))
        }
        None => Ok(Json(json!({
            "greeting": "Welcome to the study helper",
        }))),
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
