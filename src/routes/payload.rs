// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request body extraction and field validation.

use crate::error::AppError;
use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use validator::Validate;

/// JSON body that has been deserialized and passed `validator` checks.
///
/// Malformed or incomplete bodies become [`AppError::Validation`], so they get
/// the same `{success: false, ...}` response as every other failure.
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;

        value
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        Ok(Self(value))
    }
}

/// Deserialize a field that must be present but may be `null`.
///
/// Use with `#[serde(default)]`: a missing field stays `None`, `null` becomes
/// `Some(None)`.
pub fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Unwrap a field that must have been supplied.
pub fn required<T>(field: Option<T>, name: &str) -> Result<T, AppError> {
    field.ok_or_else(|| AppError::Validation(format!("Missing required field: {}", name)))
}
