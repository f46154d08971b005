//! Server configuration, loaded from environment variables at startup.

/// Runtime configuration for study-server.
///
/// Every field has a sensible default so the server works out-of-the-box
/// without any environment variables set.  The one exception is
/// `auth_secret`: the default is only suitable for development and a
/// warning is logged at startup when it is used.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address to bind (default: `"0.0.0.0:3000"`).
    pub bind_address: String,

    /// SQLite database URL (default: `"sqlite://study.db"`).
    /// Any sqlx-compatible connection string works; use
    /// `"sqlite::memory:"` for tests.
    pub database_url: String,

    /// HMAC secret for signing and verifying identity tokens.
    pub auth_secret: String,

    /// Lifetime of freshly minted identity tokens, in seconds.
    pub token_ttl_secs: u64,

    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,

    /// Comma-separated list of allowed CORS origins; `None` means wildcard.
    pub cors_allowed_origins: Option<String>,

    /// Serve Swagger UI at `/swagger-ui` (disable in production).
    pub enable_swagger: bool,
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            bind_address: env_or("STUDY_BIND", "0.0.0.0:3000"),
            database_url: env_or("STUDY_DATABASE_URL", "sqlite://study.db"),
            auth_secret: env_or("STUDY_AUTH_SECRET", "dev-secret-change-me"),
            token_ttl_secs: parse_env("STUDY_TOKEN_TTL_SECS", 86_400),
            log_level: env_or("STUDY_LOG", "info"),
            log_json: std::env::var("STUDY_LOG_JSON")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            cors_allowed_origins: std::env::var("STUDY_CORS_ORIGINS").ok(),
            enable_swagger: std::env::var("STUDY_ENABLE_SWAGGER")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true),
        }
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
