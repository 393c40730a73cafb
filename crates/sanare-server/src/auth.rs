//! Credential primitives and identity resolution.
//!
//! Passwords are hashed with Argon2id and stored as PHC strings. Bearer
//! tokens are HS256 JWTs carrying `{ id, email, userType }` with a 7-day
//! expiry, wire-compatible with the historical token payload.
//!
//! Identity resolution comes in two modes, each an axum extractor:
//! - [`Identity`] (mandatory): a missing or invalid token rejects the
//!   request with 401.
//! - [`OptionalIdentity`]: a missing or invalid token degrades silently to
//!   anonymous. Used by read endpoints whose visibility still depends on who
//!   is asking.
//!
//! The role inside a verified token is trusted as a hint; it is not
//! re-checked against the store on every request.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use sanare_store::{Role, User};

use crate::api::AppState;
use crate::error::ApiError;

/// Token lifetime.
const TOKEN_TTL_DAYS: i64 = 7;

// ---------------------------------------------------------------------------
// Password hashing
// ---------------------------------------------------------------------------

/// Hash a password using Argon2id. Returns a PHC-format string.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {e}")))?;
    Ok(hash.to_string())
}

/// Verify a password against a PHC-format hash string. A malformed stored
/// hash counts as a mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// JWT claims. Field names match the historical wire payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub id: i64,
    pub email: String,
    #[serde(rename = "userType")]
    pub user_type: String,
    pub exp: usize,
}

/// Sign a bearer token for a user.
pub fn issue_token(user: &User, secret: &str) -> Result<String, ApiError> {
    let exp = (Utc::now() + Duration::days(TOKEN_TTL_DAYS)).timestamp() as usize;
    let claims = Claims {
        id: user.id,
        email: user.email.clone(),
        user_type: user.role.as_str().to_string(),
        exp,
    };
    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("Failed to sign token: {e}")))
}

/// Verify a bearer token. Returns `None` for any invalid, tampered, or
/// expired token.
pub fn verify_token(token: &str, secret: &str) -> Option<Claims> {
    jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .ok()
}

// ---------------------------------------------------------------------------
// Identity resolution
// ---------------------------------------------------------------------------

/// The authenticated caller, resolved once per request from a verified
/// bearer token. The role is parsed into the closed [`Role`] enum here;
/// downstream policy checks switch on the enum only.
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: i64,
    pub email: String,
    pub role: Role,
}

impl Identity {
    fn from_claims(claims: Claims) -> Option<Self> {
        let role = Role::parse(&claims.user_type)?;
        Some(Self {
            id: claims.id,
            email: claims.email,
            role,
        })
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

#[async_trait]
impl FromRequestParts<AppState> for Identity {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Err(ApiError::Unauthorized("Unauthorized".to_string()));
        };

        verify_token(token, &state.config.jwt_secret)
            .and_then(Identity::from_claims)
            .ok_or_else(|| ApiError::Unauthorized("Invalid token".to_string()))
    }
}

/// Optional-mode identity: `None` for anonymous callers. An invalid token is
/// treated the same as no token rather than rejecting the request.
#[derive(Debug, Clone)]
pub struct OptionalIdentity(pub Option<Identity>);

#[async_trait]
impl FromRequestParts<AppState> for OptionalIdentity {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let identity = bearer_token(parts).and_then(|token| {
            let resolved =
                verify_token(token, &state.config.jwt_secret).and_then(Identity::from_claims);
            if resolved.is_none() {
                tracing::warn!("ignoring invalid bearer token on optional-auth route");
            }
            resolved
        });
        Ok(OptionalIdentity(identity))
    }
}
