// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Track and data point routes.
//!
//! Owner-scoped writes act on the [`CurrentUser`] loaded by the auth
//! middleware. Get-by-id and set-target resolve the track across all users.
//!
//! Replace, set-target and update-point report an unknown track or point
//! before a bad body, so those handlers take the body as a `Result`.
//! Append checks its body first.

use crate::db::UserStore;
use crate::error::{AppError, Result};
use crate::middleware::auth::CurrentUser;
use crate::models::{DataPoint, Direction, NewDataPoint, Track, TrackFields, UserWithTracks};
use crate::routes::payload::{present, required, ValidJson};
use crate::services::tracks::{point_not_found, track_not_found};
use crate::services::{GlobalTrackLookup, TrackService};
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Track routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/trax/api/tracks", get(list_own_tracks).post(create_track))
        .route("/trax/api/tracks/user/{user_id}", get(list_user_tracks))
        .route(
            "/trax/api/tracks/{track_id}",
            get(get_track)
                .post(append_points)
                .put(replace_track)
                .delete(delete_track),
        )
        .route("/trax/api/tracks/{track_id}/target", put(set_target))
        .route(
            "/trax/api/tracks/{track_id}/point/{point_id}",
            put(update_point).delete(delete_point),
        )
}

// ─── Responses ───────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TrackResponse {
    pub success: bool,
    pub track: Track,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TracksResponse {
    pub success: bool,
    pub tracks: Vec<Track>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct TargetResponse {
    pub success: bool,
    pub track: Track,
    pub updated_user: UserWithTracks,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PointResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track: Option<Track>,
    pub point: DataPoint,
}

fn track_response(track: Track) -> Json<TrackResponse> {
    Json(TrackResponse {
        success: true,
        track,
    })
}

// ─── Reads ───────────────────────────────────────────────────

/// List the caller's own tracks.
async fn list_own_tracks(Extension(current): Extension<CurrentUser>) -> Json<TracksResponse> {
    Json(TracksResponse {
        success: true,
        tracks: current.user.tracks,
    })
}

/// List every track of the given user.
async fn list_user_tracks(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<TracksResponse>> {
    let user = state
        .db
        .get_user(&user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Could not find a user with that id".to_string()))?;

    Ok(Json(TracksResponse {
        success: true,
        tracks: user.tracks,
    }))
}

/// Get any track by id, whoever owns it.
async fn get_track(
    State(state): State<Arc<AppState>>,
    Path(track_id): Path<String>,
) -> Result<Json<TrackResponse>> {
    let track = GlobalTrackLookup::new(&state.db).get_track(&track_id).await?;
    Ok(track_response(track))
}

// ─── Track writes ────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct CreateTrackRequest {
    #[validate(length(min = 1, max = 256))]
    pub name: String,
    #[serde(rename = "type")]
    #[validate(length(max = 64))]
    pub kind: String,
    #[validate(nested)]
    pub data: CreateTrackData,
}

#[derive(Deserialize, Validate)]
pub struct CreateTrackData {
    #[validate(length(min = 1, max = 32))]
    pub metric: String,
    #[serde(default, deserialize_with = "present")]
    pub target: Option<Option<f64>>,
    #[serde(rename = "increaseOrDecrease", default, deserialize_with = "present")]
    pub direction: Option<Option<Direction>>,
}

impl CreateTrackRequest {
    fn into_fields(self) -> Result<TrackFields> {
        let target = required(self.data.target, "data.target")?;
        let direction = required(self.data.direction, "data.increaseOrDecrease")?;

        Ok(TrackFields {
            name: self.name,
            kind: self.kind,
            metric: self.data.metric,
            target,
            direction: direction.unwrap_or_default(),
        })
    }
}

/// Create a track for the caller.
async fn create_track(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    ValidJson(body): ValidJson<CreateTrackRequest>,
) -> Result<Json<TrackResponse>> {
    let fields = body.into_fields()?;
    let user_id = current.user.id.clone();

    let track = TrackService::new(&state.db)
        .create_track(current.user, fields)
        .await?;

    tracing::info!(user_id = %user_id, track_id = %track.id, "Track created");
    Ok(track_response(track))
}

#[derive(Deserialize, Validate)]
pub struct ReplaceTrackRequest {
    #[validate(length(min = 1, max = 256))]
    pub name: String,
    #[serde(rename = "type")]
    #[validate(length(max = 64))]
    pub kind: String,
    #[serde(default, deserialize_with = "present")]
    pub target: Option<Option<f64>>,
    #[validate(length(min = 1, max = 32))]
    pub metric: String,
    #[serde(rename = "increaseOrDecrease")]
    pub direction: Direction,
}

impl ReplaceTrackRequest {
    fn into_fields(self) -> Result<TrackFields> {
        Ok(TrackFields {
            name: self.name,
            kind: self.kind,
            metric: self.metric,
            target: required(self.target, "target")?,
            direction: self.direction,
        })
    }
}

/// Replace all editable fields of one of the caller's tracks.
async fn replace_track(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(track_id): Path<String>,
    body: Result<ValidJson<ReplaceTrackRequest>>,
) -> Result<Json<TrackResponse>> {
    current.user.find_track(&track_id).ok_or_else(track_not_found)?;
    let ValidJson(body) = body?;
    let fields = body.into_fields()?;

    let track = TrackService::new(&state.db)
        .replace_track(current.user, &track_id, fields)
        .await?;

    tracing::info!(track_id = %track.id, "Track replaced");
    Ok(track_response(track))
}

#[derive(Deserialize, Validate)]
pub struct SetTargetRequest {
    pub target: f64,
}

/// Set the target of any track by id.
async fn set_target(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(track_id): Path<String>,
    body: Result<ValidJson<SetTargetRequest>>,
) -> Result<Json<TargetResponse>> {
    let lookup = GlobalTrackLookup::new(&state.db);
    lookup.get_track(&track_id).await?;
    let ValidJson(body) = body?;

    let (track, owner) = lookup.set_target(&track_id, Some(body.target)).await?;

    if owner.id != current.user.id {
        tracing::info!(
            caller = %current.user.id,
            owner = %owner.id,
            track_id = %track_id,
            "Target set on a track owned by another user"
        );
    }

    Ok(Json(TargetResponse {
        success: true,
        track,
        updated_user: owner.with_tracks(),
    }))
}

/// Delete one of the caller's tracks.
async fn delete_track(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(track_id): Path<String>,
) -> Result<Json<TrackResponse>> {
    let track = TrackService::new(&state.db)
        .delete_track(current.user, &track_id)
        .await?;

    tracing::info!(track_id = %track.id, "Track deleted");
    Ok(track_response(track))
}

// ─── Point writes ────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct AppendPointsRequest {
    #[serde(rename = "dataPoints")]
    pub data_points: Vec<NewDataPoint>,
}

/// Append data points to one of the caller's tracks.
async fn append_points(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(track_id): Path<String>,
    ValidJson(body): ValidJson<AppendPointsRequest>,
) -> Result<Json<TrackResponse>> {
    let track = TrackService::new(&state.db)
        .append_points(current.user, &track_id, &body.data_points)
        .await?;

    tracing::info!(
        track_id = %track.id,
        added = body.data_points.len(),
        total = track.points().len(),
        "Data points appended"
    );
    Ok(track_response(track))
}

#[derive(Deserialize, Validate)]
pub struct UpdatePointRequest {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Overwrite one point of one of the caller's tracks.
async fn update_point(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path((track_id, point_id)): Path<(String, String)>,
    body: Result<ValidJson<UpdatePointRequest>>,
) -> Result<Json<PointResponse>> {
    current
        .user
        .find_track(&track_id)
        .ok_or_else(track_not_found)?
        .find_point(&point_id)
        .ok_or_else(point_not_found)?;
    let ValidJson(body) = body?;

    let (track, point) = TrackService::new(&state.db)
        .update_point(current.user, &track_id, &point_id, body.value, body.timestamp)
        .await?;

    tracing::info!(track_id = %track.id, point_id = %point.id, "Data point updated");
    Ok(Json(PointResponse {
        success: true,
        track: Some(track),
        point,
    }))
}

/// Delete one point of one of the caller's tracks.
async fn delete_point(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path((track_id, point_id)): Path<(String, String)>,
) -> Result<Json<PointResponse>> {
    let point = TrackService::new(&state.db)
        .delete_point(current.user, &track_id, &point_id)
        .await?;

    tracing::info!(track_id = %track_id, point_id = %point.id, "Data point deleted");
    Ok(Json(PointResponse {
        success: true,
        track: None,
        point,
    }))
}
