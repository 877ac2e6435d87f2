// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Track and data point mutations.
//!
//! Every write follows the same steps: resolve the owning user, resolve the
//! nested track or point, mutate in memory, save the whole user with a version
//! check, then re-read the user and confirm the written fields landed. A
//! re-read that disagrees is [`AppError::VerificationFailed`], distinct from a
//! failed save ([`AppError::Persistence`]) and a lost race
//! ([`AppError::Conflict`]). Nothing is retried.

use crate::db::UserStore;
use crate::error::{AppError, Result};
use crate::models::{DataPoint, NewDataPoint, Track, TrackFields, User};
use chrono::{DateTime, Utc};

const TRACK_NOT_FOUND: &str = "A track could not be found with that ID for the given user";
const POINT_NOT_FOUND: &str = "A point could not be found with that ID for the given Track";

pub(crate) fn track_not_found() -> AppError {
    AppError::NotFound(TRACK_NOT_FOUND.to_string())
}

pub(crate) fn point_not_found() -> AppError {
    AppError::NotFound(POINT_NOT_FOUND.to_string())
}

/// Save `user` and check the persisted copy with `verify`.
///
/// Returns the user as re-read from storage.
async fn commit<S, F>(store: &S, mut user: User, operation: &'static str, verify: F) -> Result<User>
where
    S: UserStore,
    F: FnOnce(&User) -> bool,
{
    let expected_version = user.version;
    user.version = expected_version + 1;
    user.updated_at = Utc::now();
    user.refresh_track_index();

    store.save_user(&user, expected_version).await?;

    let persisted = store.get_user(&user.id).await?.ok_or_else(|| {
        AppError::VerificationFailed(format!("{}: user {} missing after save", operation, user.id))
    })?;

    if !verify(&persisted) {
        return Err(AppError::VerificationFailed(format!(
            "{}: persisted state of user {} does not match the write",
            operation, user.id
        )));
    }

    tracing::info!(
        user_id = %persisted.id,
        version = persisted.version,
        operation,
        "Mutation verified"
    );

    Ok(persisted)
}

fn persisted_track<'u>(user: &'u User, track_id: &str) -> Result<&'u Track> {
    user.find_track(track_id).ok_or_else(|| {
        AppError::VerificationFailed(format!("track {} missing after save", track_id))
    })
}

/// Owner-scoped track operations. Every method acts only on the user it is
/// handed, which must come from the access gate.
pub struct TrackService<'a, S> {
    store: &'a S,
}

impl<'a, S: UserStore> TrackService<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Create an empty track on `user`.
    pub async fn create_track(&self, mut user: User, fields: TrackFields) -> Result<Track> {
        let track_id = user.create_track(fields.clone()).id.clone();

        let persisted = commit(self.store, user, "create_track", |u| {
            u.find_track(&track_id)
                .is_some_and(|t| t.fields() == fields && t.points().is_empty())
        })
        .await?;

        persisted_track(&persisted, &track_id).cloned()
    }

    /// Append points to one of `user`'s tracks.
    pub async fn append_points(
        &self,
        mut user: User,
        track_id: &str,
        points: &[NewDataPoint],
    ) -> Result<Track> {
        let track = user.find_track_mut(track_id).ok_or_else(|| {
            AppError::NotFound("No such track with given id".to_string())
        })?;

        let expected_len = track.points().len() + points.len();
        let new_ids = track.append_points(points);

        let persisted = commit(self.store, user, "append_points", |u| {
            u.find_track(track_id).is_some_and(|t| {
                t.points().len() == expected_len
                    && new_ids.iter().all(|id| t.find_point(id).is_some())
            })
        })
        .await?;

        persisted_track(&persisted, track_id).cloned()
    }

    /// Replace all five editable fields of one of `user`'s tracks.
    pub async fn replace_track(
        &self,
        mut user: User,
        track_id: &str,
        fields: TrackFields,
    ) -> Result<Track> {
        let track = user.find_track_mut(track_id).ok_or_else(track_not_found)?;
        track.replace(fields.clone());

        let persisted = commit(self.store, user, "replace_track", |u| {
            u.find_track(track_id).is_some_and(|t| t.fields() == fields)
        })
        .await?;

        persisted_track(&persisted, track_id).cloned()
    }

    /// Overwrite the value and timestamp of one point.
    ///
    /// Returns the track and the updated point.
    pub async fn update_point(
        &self,
        mut user: User,
        track_id: &str,
        point_id: &str,
        value: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<(Track, DataPoint)> {
        let track = user.find_track_mut(track_id).ok_or_else(track_not_found)?;
        let expected_len = track.points().len();
        track
            .update_point(point_id, value, timestamp)
            .ok_or_else(point_not_found)?;

        let persisted = commit(self.store, user, "update_point", |u| {
            u.find_track(track_id).is_some_and(|t| {
                t.points().len() == expected_len
                    && t.find_point(point_id)
                        .is_some_and(|p| p.value == value && p.timestamp == timestamp)
            })
        })
        .await?;

        let track = persisted_track(&persisted, track_id)?;
        let point = track.find_point(point_id).cloned().ok_or_else(|| {
            AppError::VerificationFailed(format!("point {} missing after save", point_id))
        })?;

        Ok((track.clone(), point))
    }

    /// Remove one of `user`'s tracks.
    pub async fn delete_track(&self, mut user: User, track_id: &str) -> Result<Track> {
        let removed = user.remove_track(track_id).ok_or_else(track_not_found)?;

        commit(self.store, user, "delete_track", |u| {
            u.find_track(track_id).is_none()
        })
        .await?;

        Ok(removed)
    }

    /// Remove one point from one of `user`'s tracks.
    pub async fn delete_point(
        &self,
        mut user: User,
        track_id: &str,
        point_id: &str,
    ) -> Result<DataPoint> {
        let track = user.find_track_mut(track_id).ok_or_else(track_not_found)?;
        let removed = track.remove_point(point_id).ok_or_else(|| {
            AppError::NotFound(format!(
                "Could not find a point with ID {} in the Track with ID {}",
                point_id, track_id
            ))
        })?;
        let expected_len = track.points().len();

        commit(self.store, user, "delete_point", |u| {
            u.find_track(track_id).is_some_and(|t| {
                t.points().len() == expected_len && t.find_point(point_id).is_none()
            })
        })
        .await?;

        Ok(removed)
    }
}

/// Track access by id across all users, without establishing ownership.
///
/// Only get-by-id and set-target go through here. Any authenticated caller can
/// read or retarget any track it knows the id of.
pub struct GlobalTrackLookup<'a, S> {
    store: &'a S,
}

impl<'a, S: UserStore> GlobalTrackLookup<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    async fn owner_of(&self, track_id: &str) -> Result<User> {
        self.store
            .find_user_by_track(track_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Could not find a Track with that id".to_string()))
    }

    pub async fn get_track(&self, track_id: &str) -> Result<Track> {
        let owner = self.owner_of(track_id).await?;
        owner
            .find_track(track_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Could not find a Track with that id".to_string()))
    }

    /// Set (or clear) a track's target on whichever user owns it.
    ///
    /// Returns the track and its owner as persisted.
    pub async fn set_target(&self, track_id: &str, target: Option<f64>) -> Result<(Track, User)> {
        let mut owner = self.owner_of(track_id).await?;
        owner
            .find_track_mut(track_id)
            .ok_or_else(|| AppError::NotFound("Could not find a Track with that id".to_string()))?
            .set_target(target);

        let persisted = commit(self.store, owner, "set_target", |u| {
            u.find_track(track_id).is_some_and(|t| t.data.target == target)
        })
        .await?;

        let track = persisted_track(&persisted, track_id)?.clone();
        Ok((track, persisted))
    }
}
