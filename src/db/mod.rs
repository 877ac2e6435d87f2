//! Database layer.
//!
//! A user document is the only thing ever written; tracks and data points are
//! saved by saving their owner. Every save carries the version the caller
//! loaded, and a backend must reject the write with [`AppError::Conflict`] if
//! the stored version has moved on.

pub mod firestore;
pub mod memory;

pub use self::firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::config::{Config, StorageBackend};
use crate::error::AppError;
use crate::models::User;
use std::future::Future;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
}

/// Storage contract for user aggregates.
pub trait UserStore: Send + Sync {
    /// Load a user by document id.
    fn get_user(&self, user_id: &str)
        -> impl Future<Output = Result<Option<User>, AppError>> + Send;

    /// Load a user by (case-insensitive) email.
    fn find_user_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<User>, AppError>> + Send;

    /// Load whichever user owns the given track, regardless of caller.
    fn find_user_by_track(
        &self,
        track_id: &str,
    ) -> impl Future<Output = Result<Option<User>, AppError>> + Send;

    /// Insert a new user. Fails with [`AppError::Duplicate`] if the email is taken.
    fn create_user(&self, user: &User) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Replace a stored user if its version still equals `expected_version`.
    fn save_user(
        &self,
        user: &User,
        expected_version: u64,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Delete a user and everything it owns. Returns whether it existed.
    fn delete_user(&self, user_id: &str) -> impl Future<Output = Result<bool, AppError>> + Send;
}

/// The configured storage backend.
#[derive(Clone)]
pub enum Db {
    Firestore(FirestoreDb),
    Memory(MemoryDb),
}

impl Db {
    /// Connect to the backend selected in `config`.
    pub async fn connect(config: &Config) -> Result<Self, AppError> {
        match config.storage {
            StorageBackend::Firestore => {
                Ok(Self::Firestore(FirestoreDb::new(&config.gcp_project_id).await?))
            }
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage; data will not survive a restart");
                Ok(Self::Memory(MemoryDb::new()))
            }
        }
    }
}

impl UserStore for Db {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        match self {
            Db::Firestore(db) => db.get_user(user_id).await,
            Db::Memory(db) => db.get_user(user_id).await,
        }
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        match self {
            Db::Firestore(db) => db.find_user_by_email(email).await,
            Db::Memory(db) => db.find_user_by_email(email).await,
        }
    }

    async fn find_user_by_track(&self, track_id: &str) -> Result<Option<User>, AppError> {
        match self {
            Db::Firestore(db) => db.find_user_by_track(track_id).await,
            Db::Memory(db) => db.find_user_by_track(track_id).await,
        }
    }

    async fn create_user(&self, user: &User) -> Result<(), AppError> {
        match self {
            Db::Firestore(db) => db.create_user(user).await,
            Db::Memory(db) => db.create_user(user).await,
        }
    }

    async fn save_user(&self, user: &User, expected_version: u64) -> Result<(), AppError> {
        match self {
            Db::Firestore(db) => db.save_user(user, expected_version).await,
            Db::Memory(db) => db.save_user(user, expected_version).await,
        }
    }

    async fn delete_user(&self, user_id: &str) -> Result<bool, AppError> {
        match self {
            Db::Firestore(db) => db.delete_user(user_id).await,
            Db::Memory(db) => db.delete_user(user_id).await,
        }
    }
}
