use chrono::{DateTime, Utc};

/// A row in the `chat_sessions` table.
#[derive(Debug, Clone)]
pub struct ChatSession {
    pub id: i64,
    /// Owning principal.  Every access re-verifies this; the session id
    /// alone is never authorization.
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    /// Set once by [`close_session`](crate::entities::SessionStore::close_session);
    /// `None` while the session is open.
    pub closed_at: Option<DateTime<Utc>>,
}

/// A session as returned by the listing endpoint: the row plus the first
/// user message as a preview.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub preview: Option<String>,
}
