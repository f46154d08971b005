//! Administrative event creation (lecturer/admin only).
//!
//! This is the role-gated surface: an authenticated student gets 403 with
//! the required role set and their actual role in the body.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::auth::{Principal, Role};
use crate::entities::EventStore;
use crate::error::ServerError;
use crate::schemas::event::{CreateEventRequest, EventResponse};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(create_event), components(schemas(CreateEventRequest, EventResponse)))]
pub struct EventsApi;

/// Register event routes.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/events", post(create_event))
}

/// Create a course event (`POST /events`).
#[utoipa::path(
    post,
    path = "/events",
    tag = "events",
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created", body = EventResponse),
        (status = 400, description = "Empty title or body"),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Role insufficient"),
        (status = 409, description = "Duplicate title"),
    )
)]
pub async fn create_event(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Json(req): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<EventResponse>), ServerError> {
    principal.require_any(&[Role::Admin, Role::Lecturer])?;

    let title = req.title.trim();
    let body = req.body.trim();
    if title.is_empty() || body.is_empty() {
        return Err(ServerError::Validation(
            "title and body must not be empty".into(),
        ));
    }

    let event = state.store.insert_event(title, body, principal.id).await?;
    Ok((StatusCode::CREATED, Json(event.to_response())))
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use crate::auth::Role;
    use crate::routes::test_support::{bearer, body_json, request, test_app};
    use axum::http::StatusCode;

    const EVENT: &str = r#"{"title":"Exam week","body":"Bring a pencil."}"#;

    #[tokio::test]
    async fn student_is_forbidden_with_role_report() {
        let (app, state) = test_app().await;
        let token = bearer(&state, 5, Role::Student);
        let response = request(app, "POST", "/events", Some(&token), Some(EVENT)).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = body_json(response).await;
        assert_eq!(body["code"], "forbidden");
        assert_eq!(body["required"], serde_json::json!(["admin", "lecturer"]));
        assert_eq!(body["current"], "student");
    }

    #[tokio::test]
    async fn lecturer_can_create_and_duplicate_is_conflict() {
        let (app, state) = test_app().await;
        let token = bearer(&state, 5, Role::Lecturer);

        let response = request(app.clone(), "POST", "/events", Some(&token), Some(EVENT)).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["title"], "Exam week");
        assert_eq!(body["created_by"], 5);

        let response = request(app, "POST", "/events", Some(&token), Some(EVENT)).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = body_json(response).await;
        assert_eq!(body["code"], "conflict");
    }
}
