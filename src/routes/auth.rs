// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Registration, login and token re-authentication routes.

use axum::{extract::State, http::HeaderMap, routing::post, Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, extract_token, resolve_user, TOKEN_COOKIE, TOKEN_HEADER};
use crate::models::UserProfile;
use crate::routes::payload::ValidJson;
use crate::services::accounts::{self, Registration};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/trax/api/auth/register", post(register))
        .route("/trax/api/auth/login", post(login))
        .route("/trax/api/auth/authenticate_token", post(authenticate_token))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RegisterResponse {
    pub success: bool,
    pub user: UserProfile,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionResponse {
    pub success: bool,
    pub token: String,
    pub user: UserProfile,
}

#[derive(Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(email, length(max = 255))]
    pub email: String,
    #[validate(length(equal = 1))]
    pub sex: String,
    #[validate(length(min = 6, max = 1024))]
    pub password: String,
    pub password2: String,
}

/// Create an account.
async fn register(
    State(state): State<Arc<AppState>>,
    ValidJson(body): ValidJson<RegisterRequest>,
) -> Result<Json<RegisterResponse>> {
    let user = accounts::register(
        &state.db,
        Registration {
            name: &body.name,
            email: &body.email,
            sex: &body.sex,
            password: &body.password,
            password_confirmation: &body.password2,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, "Account registered");

    Ok(Json(RegisterResponse {
        success: true,
        user: user.profile(),
    }))
}

#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Exchange email and password for a session token.
///
/// The token is returned in the body, the `auth-token` header and an
/// HttpOnly cookie.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ValidJson(body): ValidJson<LoginRequest>,
) -> Result<(CookieJar, [(&'static str, String); 1], Json<SessionResponse>)> {
    let user = accounts::login(&state.db, &body.email, &body.password).await?;

    let token = create_jwt(
        &user.id,
        &state.config.jwt_signing_key,
        state.config.token_ttl_days,
    )?;

    let cookie = Cookie::build((TOKEN_COOKIE, token.clone()))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::days(state.config.token_ttl_days as i64));

    tracing::info!(user_id = %user.id, "Login successful");

    Ok((
        jar.add(cookie),
        [(TOKEN_HEADER, token.clone())],
        Json(SessionResponse {
            success: true,
            token,
            user: user.profile(),
        }),
    ))
}

/// Check a token and echo the user it belongs to.
async fn authenticate_token(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<Json<SessionResponse>> {
    let token = extract_token(&jar, &headers).ok_or(AppError::MissingCredential)?;
    let user = resolve_user(&state.db, &token, &state.config.jwt_signing_key).await?;

    Ok(Json(SessionResponse {
        success: true,
        token,
        user: user.profile(),
    }))
}
