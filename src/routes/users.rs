// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Routes for the authenticated user's own account.

use crate::db::UserStore;
use crate::error::{AppError, Result};
use crate::middleware::auth::CurrentUser;
use crate::models::UserProfile;
use crate::AppState;
use axum::{extract::State, routing::get, Extension, Json, Router};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// User routes (require authentication via JWT).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/trax/api/users/me", get(get_me).delete(delete_account))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    pub success: bool,
    pub user: UserProfile,
}

/// Current user profile.
async fn get_me(Extension(current): Extension<CurrentUser>) -> Json<UserResponse> {
    Json(UserResponse {
        success: true,
        user: current.user.profile(),
    })
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DeleteAccountResponse {
    pub success: bool,
    pub msg: String,
}

/// Delete the caller's account with every track and data point.
async fn delete_account(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<DeleteAccountResponse>> {
    tracing::info!(user_id = %current.user.id, "User-initiated account deletion");

    if !state.db.delete_user(&current.user.id).await? {
        return Err(AppError::NotFound(
            "Could not find a user with that id".to_string(),
        ));
    }

    Ok(Json(DeleteAccountResponse {
        success: true,
        msg: "Account deleted".to_string(),
    }))
}
