//! Streaming chat endpoint.
//!
//! The handler is a thin shell over [`crate::orchestrator::run_chat`]; all
//! sequencing and failure policy lives there.

use std::sync::Arc;

use axum::extract::State;
use axum::response::Response;
use axum::routing::post;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::auth::Principal;
use crate::error::ServerError;
use crate::orchestrator;
use crate::schemas::chat::ChatRequest;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(chat), components(schemas(ChatRequest)))]
pub struct ChatApi;

/// Register the chat route.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/chat", post(chat))
}

/// Authenticated streaming chat turn (`POST /chat`).
///
/// Responds with newline-delimited JSON frames: zero or more
/// `{"type":"token","delta":...}` followed by exactly one
/// `{"type":"final","reply":...,"links":[...]}`.
#[utoipa::path(
    post,
    path = "/chat",
    tag = "chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "NDJSON frame stream"),
        (status = 400, description = "Empty or oversized message"),
        (status = 401, description = "Missing, invalid, or expired token"),
        (status = 404, description = "Session not found or not owned"),
    )
)]
pub async fn chat(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Json(req): Json<ChatRequest>,
) -> Result<Response, ServerError> {
    orchestrator::run_chat(state, principal, req).await
}

// ── Tests ──────────────────────────────────────────────────────────────────────
