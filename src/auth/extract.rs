//! Axum extractors that turn a request credential into a [`Principal`].
//!
//! Extraction order is the named cookie first, then the
//! `Authorization: Bearer` header.  [`Principal`] rejects the request with
//! a sub-coded 401; [`OptionalPrincipal`] degrades silently so endpoints
//! that merely personalize keep working for anonymous callers.
//!
//! Every decision is logged with the principal id/role (success) or the
//! failure code (failure); the credential itself is never logged.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use chrono::Utc;
use tracing::{debug, warn};

use super::permission::{Permission, Role};
use super::token::{self, TokenError};
use crate::error::ServerError;
use crate::state::AppState;

/// Cookie carrying the identity token.  Issued http-only, same-site-lax,
/// and secure in production by the (out-of-scope) login service.
pub const AUTH_COOKIE_NAME: &str = "auth_token";

/// The authenticated identity derived from a verified token.
///
/// The permission set is recomputed from the role on every request via
/// [`Role::permissions`]; it is never persisted and has no per-user
/// overrides.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: i64,
    pub email: String,
    pub role: Role,
}

impl Principal {
    pub fn has(&self, permission: Permission) -> bool {
        self.role.has(permission)
    }

    /// Role-gated variant of the authorization gate: reject an
    /// authenticated-but-under-privileged principal with 403, reporting
    /// both the required role set and the actual role.
    pub fn require_any(&self, required: &[Role]) -> Result<(), ServerError> {
        if required.contains(&self.role) {
            Ok(())
        } else {
            warn!(
                principal_id = self.id,
                current = %self.role,
                ?required,
                "authorization denied: insufficient role"
            );
            Err(ServerError::Forbidden {
                required: required.to_vec(),
                current: self.role,
            })
        }
    }
}

/// Silent-degrade variant: `None` instead of a 401 on any failure.
#[derive(Debug, Clone)]
pub struct OptionalPrincipal(pub Option<Principal>);

/// Pull the raw token out of the request: cookie first, header fallback.
fn extract_credential(headers: &HeaderMap) -> Option<String> {
    cookie_value(headers, AUTH_COOKIE_NAME).or_else(|| bearer_token(headers))
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(COOKIE)?.to_str().ok()?;
    for part in raw.split(';') {
        let mut pieces = part.trim().splitn(2, '=');
        let key = pieces.next()?.trim();
        let value = pieces.next()?.trim();
        if key == name && !value.is_empty() {
            return Some(value.to_owned());
        }
    }
    None
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToOwned::to_owned)
}

/// Shared gate logic for both extractors.
fn authenticate(headers: &HeaderMap, secret: &str) -> Result<Principal, TokenError> {
    let credential = extract_credential(headers).ok_or(TokenError::Missing)?;
    let claims = token::verify(&credential, secret, Utc::now())?;
    Ok(Principal {
        id: claims.sub,
        email: claims.email,
        role: claims.role,
    })
}

impl FromRequestParts<Arc<AppState>> for Principal {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        match authenticate(&parts.headers, &state.config.auth_secret) {
            Ok(principal) => {
                debug!(
                    principal_id = principal.id,
                    role = %principal.role,
                    "authenticated"
                );
                Ok(principal)
            }
            Err(e) => {
                warn!(code = e.code(), "authentication failed");
                Err(ServerError::Unauthenticated(e))
            }
        }
    }
}

impl FromRequestParts<Arc<AppState>> for OptionalPrincipal {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        match authenticate(&parts.headers, &state.config.auth_secret) {
            Ok(principal) => {
                debug!(
                    principal_id = principal.id,
                    role = %principal.role,
                    "authenticated (optional)"
                );
                Ok(OptionalPrincipal(Some(principal)))
            }
            Err(e) => {
                debug!(code = e.code(), "proceeding unauthenticated");
                Ok(OptionalPrincipal(None))
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
