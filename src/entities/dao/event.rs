use chrono::{DateTime, Utc};

/// A row in the `events` table (administrative course announcements).
#[derive(Debug, Clone)]
pub struct EventRecord {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
}
