//! Session authentication: JWT cookies and password hashing.
//!
//! A successful login issues a JWT carrying the user id, delivered in an
//! http-only `token` cookie so scripts cannot read it. Protected handlers
//! take an [`AuthUser`] extractor argument; extraction fails with 401
//! when the cookie is absent, expired, or forged.
//!
//! Passwords are hashed with Argon2id behind the
//! [`CredentialHasher`] seam from the domain layer.

use std::sync::Arc;

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use pulse_core::{CoreError, CredentialHasher};
use pulse_types::UserId;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "token";

/// Session lifetime in hours. The cookie itself is a session cookie; the
/// token's `exp` claim is what enforces expiry.
const TOKEN_TTL_HOURS: i64 = 24;

// ---------------------------------------------------------------------------
// Token issue / verify
// ---------------------------------------------------------------------------

/// JWT claims carried by the session token.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct Claims {
    /// The authenticated user's id.
    sub: Uuid,
    /// Expiry as a Unix timestamp.
    exp: i64,
}

/// Signing and verification keys for session tokens.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SessionKeys {
    /// Derive both keys from the shared HMAC secret.
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issue a token for a user, valid for 24 hours.
    pub fn issue(&self, user: UserId) -> Result<String, ApiError> {
        let exp = Utc::now()
            .checked_add_signed(Duration::hours(TOKEN_TTL_HOURS))
            .map_or(i64::MAX, |t| t.timestamp());
        let claims = Claims {
            sub: user.into_inner(),
            exp,
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ApiError::Internal(format!("token encoding failed: {e}")))
    }

    /// Verify a token and recover the user id it was issued for.
    pub fn verify(&self, token: &str) -> Result<UserId, ApiError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|_| ApiError::Unauthenticated("User not authenticated".to_owned()))?;
        Ok(data.claims.sub.into())
    }
}

/// Build the http-only session cookie carrying a freshly issued token.
pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .same_site(SameSite::Strict)
        .path("/")
        .build()
}

/// Build the removal cookie that clears the session on logout.
pub fn clear_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .http_only(true)
        .same_site(SameSite::Strict)
        .path("/")
        .build()
}

// ---------------------------------------------------------------------------
// Extractor
// ---------------------------------------------------------------------------

/// The authenticated caller, extracted from the session cookie.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub UserId);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_owned())
            .ok_or_else(|| ApiError::Unauthenticated("User not authenticated".to_owned()))?;
        let user = state.keys.verify(&token)?;
        Ok(Self(user))
    }
}

// ---------------------------------------------------------------------------
// Password hashing
// ---------------------------------------------------------------------------

/// Argon2id-backed implementation of the domain's credential seam.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Hasher;

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, CoreError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(CoreError::storage)
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        PasswordHash::new(hash).is_ok_and(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies_to_the_same_user() {
        let keys = SessionKeys::new("test-secret");
        let user = UserId::new();
        let token = keys.issue(user).ok();
        let recovered = token.as_deref().map(|t| keys.verify(t));
        assert_eq!(recovered.and_then(Result::ok), Some(user));
    }

    #[test]
    fn token_from_another_secret_is_rejected() {
        let keys = SessionKeys::new("secret-a");
        let other = SessionKeys::new("secret-b");
        let token = keys.issue(UserId::new()).unwrap_or_default();
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn garbage_token_is_rejected() {
        let keys = SessionKeys::new("test-secret");
        assert!(keys.verify("not-a-jwt").is_err());
    }

    #[test]
    fn argon2_round_trips_and_rejects_wrong_password() {
        let hasher = Argon2Hasher;
        let hash = hasher.hash("hunter2").unwrap_or_default();
        assert!(hash.starts_with("$argon2"));
        assert!(hasher.verify("hunter2", &hash));
        assert!(!hasher.verify("hunter3", &hash));
    }

    #[test]
    fn malformed_hash_verifies_false() {
        let hasher = Argon2Hasher;
        assert!(!hasher.verify("hunter2", "not-a-hash"));
    }
}
