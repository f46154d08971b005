//! Session listing, history, close, and delete endpoints.
//!
//! Every handler re-verifies ownership through the store; a session id
//! belonging to someone else is answered exactly like a missing one.
//! Close and delete accept either the owner or an admin; administrators
//! may manage any principal's sessions.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::auth::{Principal, Role};
use crate::entities::{ChatStore, SessionStore};
use crate::error::ServerError;
use crate::schemas::session::{MessageResponse, SessionSummaryResponse};
use crate::state::AppState;

/// Ownership filter for close / delete: admins act on any session, all
/// other roles only on their own.
fn owner_filter(principal: &Principal) -> Option<i64> {
    (principal.role != Role::Admin).then_some(principal.id)
}

#[derive(OpenApi)]
#[openapi(
    paths(list_sessions, list_session_messages, close_session, delete_session),
    components(schemas(SessionSummaryResponse, MessageResponse))
)]
pub struct SessionApi;

/// Register session routes.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sessions", get(list_sessions))
        .route("/sessions/{id}", delete(delete_session))
        .route("/sessions/{id}/close", post(close_session))
        .route("/sessions/{id}/messages", get(list_session_messages))
}

/// List the caller's sessions, newest first, with first-message previews.
#[utoipa::path(
    get,
    path = "/sessions",
    tag = "sessions",
    responses(
        (status = 200, description = "Session summaries", body = Vec<SessionSummaryResponse>),
        (status = 401, description = "Unauthenticated"),
    )
)]
pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
    principal: Principal,
) -> Result<Json<Vec<SessionSummaryResponse>>, ServerError> {
    let sessions = state.store.list_sessions(principal.id).await?;
    Ok(Json(sessions.iter().map(|s| s.to_response()).collect()))
}

/// Ordered message history of one owned session.
#[utoipa::path(
    get,
    path = "/sessions/{id}/messages",
    tag = "sessions",
    responses(
        (status = 200, description = "Messages, ascending by creation time", body = Vec<MessageResponse>),
        (status = 401, description = "Unauthenticated"),
        (status = 404, description = "Session not found or not owned"),
    )
)]
pub async fn list_session_messages(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<i64>,
) -> Result<Json<Vec<MessageResponse>>, ServerError> {
    if state
        .store
        .get_owned_session(id, principal.id)
        .await?
        .is_none()
    {
        return Err(ServerError::NotFound("session not found".into()));
    }
    let messages = state.store.list_messages(id).await?;
    Ok(Json(messages.iter().map(|m| m.to_response()).collect()))
}

/// Close a session (owner or admin).  Idempotent: closing twice succeeds
/// and keeps the first close timestamp.
#[utoipa::path(
    post,
    path = "/sessions/{id}/close",
    tag = "sessions",
    responses(
        (status = 200, description = "Session closed", body = serde_json::Value),
        (status = 401, description = "Unauthenticated"),
        (status = 404, description = "Session not found or not owned"),
    )
)]
pub async fn close_session(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ServerError> {
    state
        .store
        .close_session(id, owner_filter(&principal))
        .await?;
    Ok(Json(serde_json::json!({ "closed": true })))
}

/// Hard-delete a session (owner or admin) and, via cascade, its messages.
#[utoipa::path(
    delete,
    path = "/sessions/{id}",
    tag = "sessions",
    responses(
        (status = 200, description = "Session deleted", body = serde_json::Value),
        (status = 401, description = "Unauthenticated"),
        (status = 404, description = "Session not found or not owned"),
    )
)]
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ServerError> {
    state
        .store
        .delete_session(id, owner_filter(&principal))
        .await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use crate::auth::Role;
    use crate::entities::{ChatStore, Sender, SessionStore};
    use crate::routes::test_support::{bearer, body_json, request, test_app};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn history_requires_ownership_and_is_ascending() {
        let (app, state) = test_app().await;
        let sid = state.store.resolve_or_create(1, None).await.unwrap();
        for text in ["a", "b", "c"] {
            state
                .store
                .append_message(sid, Sender::User, text)
                .await
                .unwrap();
        }

        let owner = bearer(&state, 1, Role::Student);
        let response = request(
            app.clone(),
            "GET",
            &format!("/sessions/{sid}/messages"),
            Some(&owner),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let contents: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["content"].as_str().unwrap())
            .collect();
        assert_eq!(contents, vec!["a", "b", "c"]);

        // Another principal sees 404, never the data and never 403.
        let stranger = bearer(&state, 2, Role::Student);
        let response = request(
            app,
            "GET",
            &format!("/sessions/{sid}/messages"),
            Some(&stranger),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn close_twice_succeeds_both_times() {
        let (app, state) = test_app().await;
        let sid = state.store.resolve_or_create(1, None).await.unwrap();
        let token = bearer(&state, 1, Role::Student);

        for _ in 0..2 {
            let response = request(
                app.clone(),
                "POST",
                &format!("/sessions/{sid}/close"),
                Some(&token),
                None,
            )
            .await;
            assert_eq!(response.status(), StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn delete_removes_session_from_listing() {
        let (app, state) = test_app().await;
        let sid = state.store.resolve_or_create(1, None).await.unwrap();
        let token = bearer(&state, 1, Role::Student);

        let response = request(
            app.clone(),
            "DELETE",
            &format!("/sessions/{sid}"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = request(app, "GET", "/sessions", Some(&token), None).await;
        let body = body_json(response).await;
        assert!(body.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn admin_can_close_any_session() {
        let (app, state) = test_app().await;
        let sid = state.store.resolve_or_create(1, None).await.unwrap();
        let admin = bearer(&state, 99, Role::Admin);

        let response = request(
            app,
            "POST",
            &format!("/sessions/{sid}/close"),
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let session = state.store.get_owned_session(sid, 1).await.unwrap().unwrap();
        assert!(session.closed_at.is_some());
    }

    #[tokio::test]
    async fn admin_can_delete_any_session() {
        let (app, state) = test_app().await;
        let sid = state.store.resolve_or_create(1, None).await.unwrap();
        let admin = bearer(&state, 99, Role::Admin);

        let response = request(
            app,
            "DELETE",
            &format!("/sessions/{sid}"),
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(state.store.get_owned_session(sid, 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_foreign_session_is_404() {
        let (app, state) = test_app().await;
        let sid = state.store.resolve_or_create(1, None).await.unwrap();
        let stranger = bearer(&state, 2, Role::Student);
        let response = request(
            app,
            "DELETE",
            &format!("/sessions/{sid}"),
            Some(&stranger),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
