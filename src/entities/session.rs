//! Chat-session persistence with ownership enforcement.
//!
//! Ownership violations are deliberately reported as `NotFound`, identical
//! to a session that does not exist, so one principal cannot probe which
//! session ids belong to another.  Close and delete additionally take an
//! optional owner filter so administrators can manage any session.

use std::future::Future;

use chrono::Utc;

use super::dao::{ChatSession, SessionSummary};
use super::{parse_ts, SqliteStore};
use crate::error::ServerError;

pub trait SessionStore: Send + Sync + 'static {
    /// Create a session when no id is supplied; otherwise verify the
    /// session exists *and* belongs to `user_id`, failing with `NotFound`
    /// on either miss.
    fn resolve_or_create(
        &self,
        user_id: i64,
        supplied: Option<i64>,
    ) -> impl Future<Output = Result<i64, ServerError>> + Send;

    fn get_owned_session(
        &self,
        id: i64,
        user_id: i64,
    ) -> impl Future<Output = Result<Option<ChatSession>, sqlx::Error>> + Send;

    /// Session summaries for one principal, newest first, each carrying
    /// its first user message as a preview.
    fn list_sessions(
        &self,
        user_id: i64,
    ) -> impl Future<Output = Result<Vec<SessionSummary>, sqlx::Error>> + Send;

    /// Idempotent close: the first call stamps `closed_at`; re-closing
    /// succeeds and keeps the original timestamp.  `owner` of `None`
    /// skips the ownership filter (administrators act on any session).
    fn close_session(
        &self,
        id: i64,
        owner: Option<i64>,
    ) -> impl Future<Output = Result<(), ServerError>> + Send;

    /// Hard delete; messages are removed by the `ON DELETE CASCADE`
    /// constraint, not orchestrated here.  `owner` semantics match
    /// [`SessionStore::close_session`].
    fn delete_session(
        &self,
        id: i64,
        owner: Option<i64>,
    ) -> impl Future<Output = Result<(), ServerError>> + Send;
}

impl SessionStore for SqliteStore {
    async fn resolve_or_create(
        &self,
        user_id: i64,
        supplied: Option<i64>,
    ) -> Result<i64, ServerError> {
        match supplied {
            Some(id) => match self.get_owned_session(id, user_id).await? {
                Some(session) => Ok(session.id),
                None => Err(ServerError::NotFound("session not found".into())),
            },
            None => {
                let created_at = Utc::now().to_rfc3339();
                let result = sqlx::query(
                    "INSERT INTO chat_sessions (user_id, created_at) VALUES (?1, ?2)",
                )
                .bind(user_id)
                .bind(&created_at)
                .execute(self.pool())
                .await?;
                Ok(result.last_insert_rowid())
            }
        }
    }

    async fn get_owned_session(
        &self,
        id: i64,
        user_id: i64,
    ) -> Result<Option<ChatSession>, sqlx::Error> {
        let row: Option<(i64, i64, String, Option<String>)> = sqlx::query_as(
            "SELECT id, user_id, created_at, closed_at \
             FROM chat_sessions WHERE id = ?1 AND user_id = ?2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(|(id, user_id, created_at, closed_at)| ChatSession {
            id,
            user_id,
            created_at: parse_ts(&created_at),
            closed_at: closed_at.as_deref().map(parse_ts),
        }))
    }

    async fn list_sessions(&self, user_id: i64) -> Result<Vec<SessionSummary>, sqlx::Error> {
        // The preview is a correlated single-row lookup, not a join: a join
        // would multiply session rows by message rows.
        let rows: Vec<(i64, String, Option<String>, Option<String>)> = sqlx::query_as(
            "SELECT s.id, s.created_at, s.closed_at, \
                    (SELECT m.content FROM chat_messages m \
                     WHERE m.session_id = s.id AND m.sender = 'user' \
                     ORDER BY m.created_at ASC, m.id ASC LIMIT 1) AS preview \
             FROM chat_sessions s WHERE s.user_id = ?1 \
             ORDER BY s.created_at DESC, s.id DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;
        Ok(rows
            .into_iter()
            .map(|(id, created_at, closed_at, preview)| SessionSummary {
                id,
                created_at: parse_ts(&created_at),
                closed_at: closed_at.as_deref().map(parse_ts),
                preview,
            })
            .collect())
    }

    async fn close_session(&self, id: i64, owner: Option<i64>) -> Result<(), ServerError> {
        let exists: Option<(i64,)> = sqlx::query_as(
            "SELECT id FROM chat_sessions WHERE id = ?1 AND (?2 IS NULL OR user_id = ?2)",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(self.pool())
        .await?;
        if exists.is_none() {
            return Err(ServerError::NotFound("session not found".into()));
        }
        // Only stamp when still open: re-closing succeeds without touching
        // the original close time.
        let closed_at = Utc::now().to_rfc3339();
        sqlx::query(
            "UPDATE chat_sessions SET closed_at = ?1 WHERE id = ?2 AND closed_at IS NULL",
        )
        .bind(&closed_at)
        .bind(id)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn delete_session(&self, id: i64, owner: Option<i64>) -> Result<(), ServerError> {
        let result = sqlx::query(
            "DELETE FROM chat_sessions WHERE id = ?1 AND (?2 IS NULL OR user_id = ?2)",
        )
        .bind(id)
        .bind(owner)
        .execute(self.pool())
        .await?;
        if result.rows_affected() == 0 {
            return Err(ServerError::NotFound("session not found".into()));
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;
    use crate::entities::{ChatStore, Sender};

    async fn memory_store() -> SqliteStore {
        SqliteStore::connect("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn resolve_without_id_creates_a_session() {
        let store = memory_store().await;
        let id = store.resolve_or_create(1, None).await.unwrap();
        let session = store.get_owned_session(id, 1).await.unwrap().unwrap();
        assert_eq!(session.user_id, 1);
        assert!(session.closed_at.is_none());
    }

    #[tokio::test]
    async fn resolve_with_owned_id_returns_it() {
        let store = memory_store().await;
        let id = store.resolve_or_create(1, None).await.unwrap();
        assert_eq!(store.resolve_or_create(1, Some(id)).await.unwrap(), id);
    }

    #[tokio::test]
    async fn foreign_session_is_not_found_never_forbidden() {
        let store = memory_store().await;
        let id = store.resolve_or_create(1, None).await.unwrap();
        match store.resolve_or_create(2, Some(id)).await {
            Err(ServerError::NotFound(_)) => {}
            other => panic!("expected NotFound, got {other:?}"),
        }
        // Missing sessions produce the identical error.
        match store.resolve_or_create(2, Some(9_999)).await {
            Err(ServerError::NotFound(_)) => {}
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn close_is_idempotent_and_keeps_first_timestamp() {
        let store = memory_store().await;
        let id = store.resolve_or_create(1, None).await.unwrap();

        store.close_session(id, Some(1)).await.unwrap();
        let first = store
            .get_owned_session(id, 1)
            .await
            .unwrap()
            .unwrap()
            .closed_at
            .expect("closed_at set");

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store.close_session(id, Some(1)).await.unwrap();
        let second = store
            .get_owned_session(id, 1)
            .await
            .unwrap()
            .unwrap()
            .closed_at
            .expect("closed_at still set");

        assert_eq!(first, second, "re-closing must not move the close time");
    }

    #[tokio::test]
    async fn delete_cascades_to_messages() {
        let store = memory_store().await;
        let id = store.resolve_or_create(1, None).await.unwrap();
        store
            .append_message(id, Sender::User, "hello")
            .await
            .unwrap();
        store.delete_session(id, Some(1)).await.unwrap();

        let orphan_count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM chat_messages WHERE session_id = ?1")
                .bind(id)
                .fetch_one(store.pool())
                .await
                .unwrap();
        assert_eq!(orphan_count.0, 0);
    }

    #[tokio::test]
    async fn unfiltered_close_and_delete_reach_any_owner() {
        let store = memory_store().await;
        let a = store.resolve_or_create(1, None).await.unwrap();
        let b = store.resolve_or_create(2, None).await.unwrap();

        store.close_session(a, None).await.unwrap();
        assert!(store
            .get_owned_session(a, 1)
            .await
            .unwrap()
            .unwrap()
            .closed_at
            .is_some());

        store.delete_session(b, None).await.unwrap();
        assert!(store.get_owned_session(b, 2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn filtered_close_still_rejects_strangers() {
        let store = memory_store().await;
        let id = store.resolve_or_create(1, None).await.unwrap();
        match store.close_session(id, Some(2)).await {
            Err(ServerError::NotFound(_)) => {}
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn listing_carries_first_user_message_preview() {
        let store = memory_store().await;
        let id = store.resolve_or_create(1, None).await.unwrap();
        store
            .append_message(id, Sender::User, "first question")
            .await
            .unwrap();
        store
            .append_message(id, Sender::Assistant, "an answer")
            .await
            .unwrap();
        store
            .append_message(id, Sender::User, "second question")
            .await
            .unwrap();

        let sessions = store.list_sessions(1).await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].preview.as_deref(), Some("first question"));
    }

    #[tokio::test]
    async fn listing_is_newest_first_and_scoped_to_owner() {
        let store = memory_store().await;
        let a = store.resolve_or_create(1, None).await.unwrap();
        let b = store.resolve_or_create(1, None).await.unwrap();
        store.resolve_or_create(2, None).await.unwrap();

        let sessions = store.list_sessions(1).await.unwrap();
        assert_eq!(
            sessions.iter().map(|s| s.id).collect::<Vec<_>>(),
            vec![b, a]
        );
    }
}
