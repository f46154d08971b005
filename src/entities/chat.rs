//! Append-only message log.
//!
//! Messages are immutable once written: there is no update or per-message
//! delete anywhere in this API, only whole-session deletion (see
//! [`SessionStore::delete_session`](super::SessionStore::delete_session)).

use std::future::Future;

use chrono::Utc;

use super::dao::{ChatMessage, Sender};
use super::{parse_ts, SqliteStore};
use crate::error::ServerError;

pub trait ChatStore: Send + Sync + 'static {
    /// Append one message.  Content must be non-empty after trimming.
    fn append_message(
        &self,
        session_id: i64,
        sender: Sender,
        content: &str,
    ) -> impl Future<Output = Result<ChatMessage, ServerError>> + Send;

    /// All messages of one session, ascending by creation time.
    fn list_messages(
        &self,
        session_id: i64,
    ) -> impl Future<Output = Result<Vec<ChatMessage>, sqlx::Error>> + Send;
}

impl ChatStore for SqliteStore {
    async fn append_message(
        &self,
        session_id: i64,
        sender: Sender,
        content: &str,
    ) -> Result<ChatMessage, ServerError> {
        if content.trim().is_empty() {
            return Err(ServerError::Validation(
                "message content must not be empty".into(),
            ));
        }
        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO chat_messages (session_id, sender, content, created_at) \
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(session_id)
        .bind(sender.as_str())
        .bind(content)
        .bind(created_at.to_rfc3339())
        .execute(self.pool())
        .await?;
        Ok(ChatMessage {
            id: result.last_insert_rowid(),
            session_id,
            sender,
            content: content.to_owned(),
            created_at,
        })
    }

    async fn list_messages(&self, session_id: i64) -> Result<Vec<ChatMessage>, sqlx::Error> {
        let rows: Vec<(i64, i64, String, String, String)> = sqlx::query_as(
            "SELECT id, session_id, sender, content, created_at \
             FROM chat_messages WHERE session_id = ?1 \
             ORDER BY created_at ASC, id ASC",
        )
        .bind(session_id)
        .fetch_all(self.pool())
        .await?;
        Ok(rows
            .into_iter()
            .map(|(id, session_id, sender, content, created_at)| ChatMessage {
                id,
                session_id,
                sender: Sender::parse(&sender).unwrap_or(Sender::User),
                content,
                created_at: parse_ts(&created_at),
            })
            .collect())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
