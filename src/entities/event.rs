//! Administrative course events.

use std::future::Future;

use chrono::Utc;

use super::dao::EventRecord;
use super::SqliteStore;
use crate::error::ServerError;

pub trait EventStore: Send + Sync + 'static {
    /// Insert an event; a duplicate title fails with `Conflict`.
    fn insert_event(
        &self,
        title: &str,
        body: &str,
        created_by: i64,
    ) -> impl Future<Output = Result<EventRecord, ServerError>> + Send;
}

impl EventStore for SqliteStore {
    async fn insert_event(
        &self,
        title: &str,
        body: &str,
        created_by: i64,
    ) -> Result<EventRecord, ServerError> {
        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO events (title, body, created_by, created_at) \
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(title)
        .bind(body)
        .bind(created_by)
        .bind(created_at.to_rfc3339())
        .execute(self.pool())
        .await;

        match result {
            Ok(done) => Ok(EventRecord {
                id: done.last_insert_rowid(),
                title: title.to_owned(),
                body: body.to_owned(),
                created_by,
                created_at,
            }),
            Err(e) => {
                let duplicate = e
                    .as_database_error()
                    .map(|d| d.is_unique_violation())
                    .unwrap_or(false);
                if duplicate {
                    Err(ServerError::Conflict(format!(
                        "an event titled '{title}' already exists"
                    )))
                } else {
                    Err(e.into())
                }
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
