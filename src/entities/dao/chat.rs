use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Who wrote a message: the human or the generated reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Assistant => "assistant",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Sender::User),
            "assistant" => Some(Sender::Assistant),
            _ => None,
        }
    }
}

/// A single message row in the `chat_messages` table.  Immutable once
/// written; the log only grows.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: i64,
    pub session_id: i64,
    pub sender: Sender,
    pub content: String,
    /// Ordering key within the session.
    pub created_at: DateTime<Utc>,
}
