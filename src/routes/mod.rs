//! Axum router construction.
//!
//! [`build`] assembles the complete application router, including:
//! - Middleware layers (CORS, per-request trace-ID injection)
//! - Optional Swagger UI / OpenAPI spec endpoint (disable with `STUDY_ENABLE_SWAGGER=false`)
//! - Health / heartbeat route
//! - Chat, session, dashboard, and event routes

mod chat;
mod dashboard;
mod events;
mod health;
mod session;

use std::sync::Arc;

use axum::middleware;
use axum::Router;
use tower::ServiceBuilder;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::middleware::{cors, trace};
use crate::state::AppState;

// ── Router builder ────────────────────────────────────────────────────────────

/// Build the complete Axum [`Router`] for the application.
pub fn build(state: Arc<AppState>) -> Router {
    let mut app = Router::new()
        .merge(health::router())
        .merge(dashboard::router())
        .merge(chat::router())
        .merge(session::router())
        .merge(events::router());

    // Enabled by default; disable with STUDY_ENABLE_SWAGGER=false in
    // production to avoid exposing the API structure.
    if state.config.enable_swagger {
        app = app.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api_docs()));
    }

    app
        // Outermost layers execute first on the way in.
        .layer(ServiceBuilder::new().layer(cors::cors_layer(state.clone())))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            trace::trace_middleware,
        ))
        .with_state(state)
}

#[derive(OpenApi)]
#[openapi()]
struct Api;

pub fn api_docs() -> utoipa::openapi::OpenApi {
    let mut spec = Api::openapi();
    spec.merge(health::HealthApi::openapi());
    spec.merge(dashboard::DashboardApi::openapi());
    spec.merge(chat::ChatApi::openapi());
    spec.merge(session::SessionApi::openapi());
    spec.merge(events::EventsApi::openapi());
    spec
}

// ── Test support ──────────────────────────────────────────────────────────────
