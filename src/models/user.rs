//! User model for storage and API.

use super::track::{new_id, Track, TrackFields};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Short sex code recorded at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Sex {
    #[serde(rename = "m")]
    Male,
    #[serde(rename = "f")]
    Female,
}

impl Sex {
    /// Parse the case-insensitive single-letter code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "m" => Some(Self::Male),
            "f" => Some(Self::Female),
            _ => None,
        }
    }
}

/// User document stored in Firestore. Owns every track and data point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Also used as document ID
    pub id: String,
    pub name: String,
    /// Stored lowercase; unique across users
    pub email: String,
    pub sex: Sex,
    /// PBKDF2 hash, see `services::password`
    pub password_hash: String,
    #[serde(default)]
    pub tracks: Vec<Track>,
    /// Ids of `tracks`, queried for lookups by track id
    #[serde(default)]
    pub track_ids: Vec<String>,
    /// Incremented on every save
    #[serde(default)]
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public view of a user (never includes the password hash).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub sex: Sex,
}

/// Profile plus tracks, echoed after a target update.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct UserWithTracks {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub tracks: Vec<Track>,
}

impl User {
    pub fn new(name: String, email: &str, sex: Sex, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            name,
            email: email.trim().to_lowercase(),
            sex,
            password_hash,
            tracks: Vec::new(),
            track_ids: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            sex: self.sex,
        }
    }

    pub fn with_tracks(&self) -> UserWithTracks {
        UserWithTracks {
            profile: self.profile(),
            tracks: self.tracks.clone(),
        }
    }

    /// Append a new, empty track and return it.
    pub fn create_track(&mut self, fields: TrackFields) -> &Track {
        self.tracks.push(Track::new(fields));
        self.refresh_track_index();
        &self.tracks[self.tracks.len() - 1]
    }

    /// Look a track up among this user's own tracks only.
    pub fn find_track(&self, track_id: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == track_id)
    }

    pub fn find_track_mut(&mut self, track_id: &str) -> Option<&mut Track> {
        self.tracks.iter_mut().find(|t| t.id == track_id)
    }

    pub fn remove_track(&mut self, track_id: &str) -> Option<Track> {
        let index = self.tracks.iter().position(|t| t.id == track_id)?;
        let removed = self.tracks.remove(index);
        self.refresh_track_index();
        Some(removed)
    }

    /// Rebuild `track_ids` from `tracks`.
    pub fn refresh_track_index(&mut self) {
        self.track_ids = self.tracks.iter().map(|t| t.id.clone()).collect();
    }
}
