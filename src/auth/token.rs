//! Signed, expiring identity tokens.
//!
//! Token format: `v1.<base64url(claims json)>.<base64url(hmac-sha256 sig)>`.
//! The signature covers the encoded payload segment.  Verification checks
//! the signature *before* the expiry so that an expired-but-genuine token
//! is reported as [`TokenError::Expired`], never [`TokenError::BadSignature`].

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use super::permission::Role;

type HmacSha256 = Hmac<Sha256>;

const TOKEN_VERSION: &str = "v1";

/// Claim set carried inside an identity token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Numeric user id.
    pub sub: i64,
    pub email: String,
    pub role: Role,
    /// Expiry as unix seconds.  A token expiring at T is invalid at any
    /// instant ≥ T.
    pub exp: i64,
}

/// Why a credential could not be turned into a [`Claims`] value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("no credential supplied")]
    Missing,
    #[error("token is malformed")]
    Malformed,
    #[error("token signature is invalid")]
    BadSignature,
    #[error("token has expired")]
    Expired,
}

impl TokenError {
    /// Sub-code surfaced in the 401 JSON body.
    pub fn code(&self) -> &'static str {
        match self {
            TokenError::Missing => "missing_token",
            TokenError::Malformed | TokenError::BadSignature => "invalid_token",
            TokenError::Expired => "expired_token",
        }
    }
}

/// Sign `claims` with `secret`, producing a transportable token string.
pub fn mint(claims: &Claims, secret: &str) -> Result<String, anyhow::Error> {
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?);
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())?;
    mac.update(payload.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
    Ok(format!("{TOKEN_VERSION}.{payload}.{signature}"))
}

/// Verify `token` against `secret` at instant `now`.
pub fn verify(token: &str, secret: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
    let mut parts = token.splitn(3, '.');
    let version = parts.next().unwrap_or_default();
    let payload = parts.next().unwrap_or_default();
    let signature = parts.next().unwrap_or_default();
    if version != TOKEN_VERSION || payload.is_empty() || signature.is_empty() {
        return Err(TokenError::Malformed);
    }

    let signature_bytes = URL_SAFE_NO_PAD
        .decode(signature)
        .map_err(|_| TokenError::Malformed)?;

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| TokenError::BadSignature)?;
    mac.update(payload.as_bytes());
    mac.verify_slice(&signature_bytes)
        .map_err(|_| TokenError::BadSignature)?;

    let claims_bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| TokenError::Malformed)?;
    let claims: Claims =
        serde_json::from_slice(&claims_bytes).map_err(|_| TokenError::Malformed)?;

    if now.timestamp() >= claims.exp {
        return Err(TokenError::Expired);
    }
    Ok(claims)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;

    const SECRET: &str = "test-secret";

    fn claims(exp: i64) -> Claims {
        Claims {
            sub: 7,
            email: "ada@example.edu".into(),
            role: Role::Student,
            exp,
        }
    }

    #[test]
    fn round_trip() {
        let now = Utc::now();
        let c = claims(now.timestamp() + 60);
        let token = mint(&c, SECRET).unwrap();
        let verified = verify(&token, SECRET, now).unwrap();
        assert_eq!(verified, c);
    }

    #[test]
    fn wrong_secret_is_bad_signature() {
        let now = Utc::now();
        let token = mint(&claims(now.timestamp() + 60), SECRET).unwrap();
        assert_eq!(
            verify(&token, "other-secret", now),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn tampered_payload_is_bad_signature() {
        let now = Utc::now();
        let token = mint(&claims(now.timestamp() + 60), SECRET).unwrap();
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged_payload = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&claims(now.timestamp() + 9_999_999)).unwrap(),
        );
        parts[1] = &forged_payload;
        let forged = parts.join(".");
        assert_eq!(verify(&forged, SECRET, now), Err(TokenError::BadSignature));
    }

    #[test]
    fn garbage_is_malformed() {
        let now = Utc::now();
        assert_eq!(verify("not-a-token", SECRET, now), Err(TokenError::Malformed));
        assert_eq!(verify("v1..", SECRET, now), Err(TokenError::Malformed));
        assert_eq!(
            verify("v2.abc.def", SECRET, now),
            Err(TokenError::Malformed)
        );
    }

    #[test]
    fn expiry_boundary_is_expired_not_invalid() {
        // A token expiring exactly at T must be rejected at T with the
        // expired sub-code, since its signature is genuine.
        let t = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let token = mint(&claims(t.timestamp()), SECRET).unwrap();
        assert_eq!(verify(&token, SECRET, t), Err(TokenError::Expired));
        assert_eq!(
            verify(&token, SECRET, t + chrono::Duration::seconds(1)),
            Err(TokenError::Expired)
        );
        // Still valid strictly before T.
        assert!(verify(&token, SECRET, t - chrono::Duration::seconds(1)).is_ok());
    }
}
