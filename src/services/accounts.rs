// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account registration and login.

use crate::db::UserStore;
use crate::error::{AppError, Result};
use crate::models::{Sex, User};
use crate::services::password::{hash_password, verify_password};

/// Registration input after field-level validation.
pub struct Registration<'r> {
    pub name: &'r str,
    pub email: &'r str,
    pub sex: &'r str,
    pub password: &'r str,
    pub password_confirmation: &'r str,
}

/// Create a new user with a hashed password.
pub async fn register<S: UserStore>(store: &S, registration: Registration<'_>) -> Result<User> {
    let sex = Sex::from_code(registration.sex)
        .ok_or_else(|| AppError::Validation("The sex of the person must be set".to_string()))?;

    if registration.password != registration.password_confirmation {
        return Err(AppError::Validation(
            "The passwords provided do not match".to_string(),
        ));
    }

    if store.find_user_by_email(registration.email).await?.is_some() {
        return Err(AppError::Duplicate(
            "An account with that email address already exists, try logging in".to_string(),
        ));
    }

    let password_hash = hash_password(registration.password)?;
    let user = User::new(
        registration.name.trim().to_string(),
        registration.email,
        sex,
        password_hash,
    );

    store.create_user(&user).await?;
    Ok(user)
}

/// Check credentials and return the matching user.
pub async fn login<S: UserStore>(store: &S, email: &str, password: &str) -> Result<User> {
    let user = store.find_user_by_email(email).await?.ok_or_else(|| {
        AppError::NotFound("An account with that email address does not exist".to_string())
    })?;

    if !verify_password(password, &user.password_hash) {
        tracing::info!(user_id = %user.id, "Login rejected: wrong password");
        return Err(AppError::InvalidPassword);
    }

    Ok(user)
}
