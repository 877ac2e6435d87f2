// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT authentication middleware.
//!
//! Resolves the caller's credential to their own [`User`] and hands it to the
//! handlers as a [`CurrentUser`] extension.

use crate::db::UserStore;
use crate::error::AppError;
use crate::models::User;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Session cookie set at login.
pub const TOKEN_COOKIE: &str = "trax_token";
/// Header carrying the raw token.
pub const TOKEN_HEADER: &str = "auth-token";

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// The authenticated caller, loaded fresh for this request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub token: String,
}

/// Find the credential: cookie, then `auth-token`, then `Authorization: Bearer`.
pub fn extract_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(TOKEN_COOKIE) {
        return Some(cookie.value().to_string());
    }

    if let Some(raw) = headers.get(TOKEN_HEADER).and_then(|h| h.to_str().ok()) {
        return Some(raw.trim().to_string());
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
}

/// Verify `token` and load the user it names.
pub async fn resolve_user<S: UserStore>(
    store: &S,
    token: &str,
    signing_key: &[u8],
) -> Result<User, AppError> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| {
        tracing::debug!(error = %e, "Rejected credential");
        AppError::InvalidCredential
    })?;

    store
        .get_user(&token_data.claims.sub)
        .await?
        .ok_or(AppError::SubjectNotFound)
}

/// Middleware that requires valid JWT authentication.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(&jar, request.headers()).ok_or(AppError::MissingCredential)?;
    let user = resolve_user(&state.db, &token, &state.config.jwt_signing_key).await?;

    tracing::debug!(user_id = %user.id, "Authenticated request");
    request.extensions_mut().insert(CurrentUser { user, token });

    Ok(next.run(request).await)
}

/// Create a JWT for a user session.
pub fn create_jwt(user_id: &str, signing_key: &[u8], ttl_days: u64) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;
    let exp = usize::try_from(ttl_days)
        .ok()
        .and_then(|days| days.checked_mul(24 * 60 * 60))
        .and_then(|secs| now.checked_add(secs))
        .ok_or_else(|| anyhow::anyhow!("Token lifetime of {} days is out of range", ttl_days))?;

    let claims = Claims {
        sub: user_id.to_string(),
        iat: now,
        exp,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}
