//! Request type for the streaming chat endpoint.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of `POST /chat`.
///
/// When `sessionId` is omitted a new session is created implicitly and its
/// id can be discovered afterwards via `GET /sessions`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatRequest {
    /// The user's message; must be non-empty after trimming.
    pub message: String,
    /// Existing session to continue; must belong to the caller.
    #[serde(rename = "sessionId", skip_serializing_if = "Option::is_none", default)]
    pub session_id: Option<i64>,
}
