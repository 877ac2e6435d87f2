//! In-memory user store using `DashMap`.
//!
//! Data is lost on process restart. Used for local runs with
//! `STORAGE_BACKEND=memory` and by the test suite.

use super::UserStore;
use crate::error::AppError;
use crate::models::User;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// Concurrent user store keyed by user id, with an email index.
#[derive(Clone, Default)]
pub struct MemoryDb {
    users: Arc<DashMap<String, User>>,
    /// email -> user id
    emails: Arc<DashMap<String, String>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl UserStore for MemoryDb {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.get(user_id).map(|u| u.value().clone()))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let email = email.trim().to_lowercase();
        let Some(user_id) = self.emails.get(&email).map(|id| id.value().clone()) else {
            return Ok(None);
        };
        self.get_user(&user_id).await
    }

    async fn find_user_by_track(&self, track_id: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .iter()
            .find(|entry| entry.track_ids.iter().any(|id| id == track_id))
            .map(|entry| entry.value().clone()))
    }

    async fn create_user(&self, user: &User) -> Result<(), AppError> {
        match self.emails.entry(user.email.clone()) {
            Entry::Occupied(_) => {
                return Err(AppError::Duplicate(
                    "An account with that email address already exists, try logging in"
                        .to_string(),
                ))
            }
            Entry::Vacant(slot) => {
                slot.insert(user.id.clone());
            }
        }

        self.users.insert(user.id.clone(), user.clone());
        tracing::info!(user_id = %user.id, "User created");
        Ok(())
    }

    async fn save_user(&self, user: &User, expected_version: u64) -> Result<(), AppError> {
        let Some(mut current) = self.users.get_mut(&user.id) else {
            return Err(AppError::NotFound(format!(
                "User {} no longer exists",
                user.id
            )));
        };

        if current.version != expected_version {
            return Err(AppError::Conflict(format!(
                "user {} is at version {}, expected {}",
                user.id, current.version, expected_version
            )));
        }

        *current = user.clone();
        tracing::debug!(user_id = %user.id, version = user.version, "User saved");
        Ok(())
    }

    async fn delete_user(&self, user_id: &str) -> Result<bool, AppError> {
        match self.users.remove(user_id) {
            Some((_, user)) => {
                self.emails.remove(&user.email);
                tracing::info!(user_id, "User deleted");
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
