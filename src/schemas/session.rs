//! Response types for the session listing and history endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{ChatMessage, Sender, SessionSummary};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionSummaryResponse {
    pub id: i64,
    pub created_at: String,
    pub closed_at: Option<String>,
    /// First user message of the session, if any.
    pub preview: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub id: i64,
    pub session_id: i64,
    pub sender: Sender,
    pub content: String,
    pub created_at: String,
}

impl SessionSummary {
    pub fn to_response(&self) -> SessionSummaryResponse {
        SessionSummaryResponse {
            id: self.id,
            created_at: self.created_at.to_rfc3339(),
            closed_at: self.closed_at.map(|t| t.to_rfc3339()),
            preview: self.preview.clone(),
        }
    }
}

impl ChatMessage {
    pub fn to_response(&self) -> MessageResponse {
        MessageResponse {
            id: self.id,
            session_id: self.session_id,
            sender: self.sender,
            content: self.content.clone(),
            created_at: self.created_at.to_rfc3339(),
        }
    }
}
