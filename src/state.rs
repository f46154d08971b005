//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use crate::config::Config;
use crate::entities::SqliteStore;
use crate::generator::ReplyGenerator;
use crate::stream::PacingPolicy;

/// State shared across all HTTP handlers.
///
/// The storage pool is injected here with an explicit lifecycle: opened in
/// `main` before the router is built, shared by reference, and closed when
/// the process drains.  No ambient globals.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration (env-derived).
    pub config: Arc<Config>,
    /// Session / message / event persistence.
    pub store: Arc<SqliteStore>,
    /// Produces a complete reply string before streaming starts.
    pub generator: Arc<dyn ReplyGenerator>,
    /// Typing-cadence delays for the chat stream; zeroed in tests.
    pub pacing: PacingPolicy,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("store", &self.store)
            .field("pacing", &self.pacing)
            .finish_non_exhaustive()
    }
}
