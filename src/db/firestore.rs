// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! One collection, `users`, keyed by user id. Each document embeds the user's
//! tracks and their data points. The `track_ids` array mirrors the embedded
//! track ids so that a track can be found with an `array_contains` query.

use super::{collections, UserStore};
use crate::error::AppError;
use crate::models::User;
use firestore::errors::FirestoreError;
use firestore::FirestoreConsistencySelector;

/// gRPC status Firestore returns when transactions contend for a document.
const ABORTED: &str = "Aborted";

/// Map a transaction failure caused by a concurrent writer to `Conflict` and
/// anything else to `Persistence`.
fn contention_or(err: FirestoreError, user_id: &str, context: &str) -> AppError {
    match &err {
        FirestoreError::DatabaseError(db_err) if db_err.public.code == ABORTED => {
            AppError::Conflict(format!("user {} was saved concurrently: {}", user_id, err))
        }
        FirestoreError::DataConflictError(_) => {
            AppError::Conflict(format!("user {} was saved concurrently: {}", user_id, err))
        }
        _ => AppError::Persistence(format!("{}: {}", context, err)),
    }
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Persistence(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Persistence(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create an offline client. Every operation returns an error.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client.as_ref().ok_or_else(|| {
            AppError::Persistence("Database not connected (offline mode)".to_string())
        })
    }

    async fn query_one(
        &self,
        field: &'static str,
        value: String,
        array: bool,
    ) -> Result<Option<User>, AppError> {
        let mut users: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| {
                if array {
                    q.field(field).array_contains(value.clone())
                } else {
                    q.field(field).eq(value.clone())
                }
            })
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Persistence(e.to_string()))?;

        Ok(users.pop())
    }

    async fn write_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Persistence(e.to_string()))?;
        Ok(())
    }
}

impl UserStore for FirestoreDb {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Persistence(e.to_string()))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.query_one("email", email.trim().to_lowercase(), false)
            .await
    }

    async fn find_user_by_track(&self, track_id: &str) -> Result<Option<User>, AppError> {
        self.query_one("track_ids", track_id.to_string(), true).await
    }

    /// Email uniqueness is check-then-write here; two simultaneous
    /// registrations with the same email can both succeed.
    async fn create_user(&self, user: &User) -> Result<(), AppError> {
        if self.find_user_by_email(&user.email).await?.is_some() {
            return Err(AppError::Duplicate(
                "An account with that email address already exists, try logging in".to_string(),
            ));
        }

        self.write_user(user).await?;
        tracing::info!(user_id = %user.id, "User created");
        Ok(())
    }

    /// Versioned save inside a transaction.
    ///
    /// The current document is read through the transaction, so Firestore
    /// holds it for this transaction until commit. A concurrent save of the
    /// same user either sees the bumped version or is aborted, and both cases
    /// surface as [`AppError::Conflict`].
    async fn save_user(&self, user: &User, expected_version: u64) -> Result<(), AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Persistence(format!("Failed to begin transaction: {}", e)))?;

        let current: Option<User> = client
            .clone_with_consistency_selector(FirestoreConsistencySelector::Transaction(
                transaction.transaction_id().clone(),
            ))
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(&user.id)
            .await
            .map_err(|e| contention_or(e, &user.id, "Failed to read user in transaction"))?;

        let stored_version = match current {
            Some(current) => current.version,
            None => {
                let _ = transaction.rollback().await;
                return Err(AppError::NotFound(format!("User {} no longer exists", user.id)));
            }
        };

        if stored_version != expected_version {
            let _ = transaction.rollback().await;
            return Err(AppError::Conflict(format!(
                "user {} is at version {}, expected {}",
                user.id, stored_version, expected_version
            )));
        }

        client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Persistence(format!("Failed to add user to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| contention_or(e, &user.id, "Transaction commit failed"))?;

        tracing::debug!(
            user_id = %user.id,
            version = user.version,
            tracks = user.tracks.len(),
            "User saved"
        );

        Ok(())
    }

    async fn delete_user(&self, user_id: &str) -> Result<bool, AppError> {
        if self.get_user(user_id).await?.is_none() {
            return Ok(false);
        }

        self.get_client()?
            .fluent()
            .delete()
            .from(collections::USERS)
            .document_id(user_id)
            .execute()
            .await
            .map_err(|e| AppError::Persistence(e.to_string()))?;

        tracing::info!(user_id, "User deleted");
        Ok(true)
    }
}
