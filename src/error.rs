// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Missing token")]
    MissingCredential,

    #[error("Bad authentication")]
    InvalidCredential,

    #[error("No user matching given token")]
    SubjectNotFound,

    #[error("That password is incorrect")]
    InvalidPassword,

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    Duplicate(String),

    /// Another writer saved the same aggregate first.
    #[error("Concurrent modification: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Persistence(String),

    /// The save call succeeded but the re-read state does not match.
    #[error("Write was not verified: {0}")]
    VerificationFailed(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::MissingCredential => "missing_credential",
            AppError::InvalidCredential => "invalid_credential",
            AppError::SubjectNotFound => "subject_not_found",
            AppError::InvalidPassword => "invalid_password",
            AppError::Validation(_) => "validation_failed",
            AppError::NotFound(_) => "not_found",
            AppError::Duplicate(_) => "already_exists",
            AppError::Conflict(_) => "conflict",
            AppError::Persistence(_) => "persistence_failed",
            AppError::VerificationFailed(_) => "write_not_verified",
            AppError::Internal(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingCredential
            | AppError::InvalidCredential
            | AppError::InvalidPassword => StatusCode::UNAUTHORIZED,
            AppError::SubjectNotFound | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Duplicate(_) | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Persistence(_)
            | AppError::VerificationFailed(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: &'static str,
    msg: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let msg = match &self {
            AppError::Persistence(detail) => {
                tracing::error!(error = %detail, "Database error");
                "It has not been possible to save the changes at this time".to_string()
            }
            AppError::VerificationFailed(detail) => {
                tracing::error!(error = %detail, "Persisted state does not match the write");
                "The update was not successful".to_string()
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                "Internal server error".to_string()
            }
            AppError::Conflict(detail) => {
                tracing::warn!(error = %detail, "Concurrent write rejected");
                self.to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorResponse {
            success: false,
            error: self.code(),
            msg,
        };

        (self.status(), Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
