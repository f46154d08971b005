//! Persistence layer.
//!
//! Each store concern is a trait ([`SessionStore`], [`ChatStore`],
//! [`EventStore`]); the default implementation for all of them is
//! [`SqliteStore`].  To swap to another database, implement the traits for
//! a new type and change the concrete type in [`crate::state::AppState`].
//!
//! All trait methods use `impl Future` in their signatures (stable since
//! Rust 1.75) so no extra `async-trait` crate is required.

pub mod chat;
pub mod dao;
pub mod event;
pub mod session;

pub use chat::ChatStore;
pub use dao::{ChatMessage, ChatSession, EventRecord, Sender, SessionSummary};
pub use event::EventStore;
pub use session::SessionStore;

use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

/// SQLite-backed store for sessions, messages, and events.
///
/// # Migrations path
///
/// `sqlx::migrate!("./migrations")` resolves the path **at compile time**
/// relative to `CARGO_MANIFEST_DIR`, so the migration files are embedded
/// into the binary.  The database location is determined at runtime by
/// `STUDY_DATABASE_URL`.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the SQLite database at `url` and run pending
    /// migrations.  Foreign keys are enabled on every connection so that
    /// deleting a session cascades to its messages.
    pub async fn connect(url: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);
        // An in-memory database exists per connection; a single-connection
        // pool keeps the migrated schema visible to every query.
        let max_connections = if url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Cheap liveness probe used by the health endpoint.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Parse an RFC 3339 timestamp column, falling back to `now` on corruption
/// rather than failing the whole query.
pub(crate) fn parse_ts(raw: &str) -> DateTime<Utc> {
    raw.parse().unwrap_or_else(|e: chrono::ParseError| {
        tracing::warn!(raw = %raw, error = %e, "failed to parse stored timestamp; using now");
        Utc::now()
    })
}
