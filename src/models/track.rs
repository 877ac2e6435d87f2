// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Track and data point sub-documents.
//!
//! Both live inside a [`User`](super::User) document and are never stored on
//! their own. Lookups are linear scans over the owning sequence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub const DEFAULT_TRACK_TYPE: &str = "weight";
pub const DEFAULT_METRIC: &str = "g";

fn default_kind() -> String {
    DEFAULT_TRACK_TYPE.to_string()
}

fn default_metric() -> String {
    DEFAULT_METRIC.to_string()
}

/// Whether progress toward the target is measured upward or downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Increase,
    #[default]
    Decrease,
}

/// One timestamped measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DataPoint {
    pub id: String,
    pub value: f64,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub timestamp: DateTime<Utc>,
}

/// A point as supplied by a caller, before it has an id.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct NewDataPoint {
    pub value: f64,
    /// Defaults to the time of insertion
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// The measurement series and its goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct TrackData {
    #[serde(default)]
    pub data_points: Vec<DataPoint>,
    #[serde(default = "default_metric")]
    pub metric: String,
    #[serde(rename = "increaseOrDecrease", default)]
    pub direction: Direction,
    #[serde(default)]
    pub target: Option<f64>,
}

/// The five caller-editable fields of a track.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackFields {
    pub name: String,
    pub kind: String,
    pub metric: String,
    pub target: Option<f64>,
    pub direction: Direction,
}

/// A named metric series owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    pub data: TrackData,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub updated_at: DateTime<Utc>,
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl Track {
    /// Build a track with a fresh id and no data points.
    pub fn new(fields: TrackFields) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            name: fields.name,
            kind: fields.kind,
            data: TrackData {
                data_points: Vec::new(),
                metric: fields.metric,
                direction: fields.direction,
                target: fields.target,
            },
            created_at: now,
            updated_at: now,
        }
    }

    pub fn fields(&self) -> TrackFields {
        TrackFields {
            name: self.name.clone(),
            kind: self.kind.clone(),
            metric: self.data.metric.clone(),
            target: self.data.target,
            direction: self.data.direction,
        }
    }

    /// Replace all editable fields at once. Data points are untouched.
    pub fn replace(&mut self, fields: TrackFields) {
        self.name = fields.name;
        self.kind = fields.kind;
        self.data.metric = fields.metric;
        self.data.target = fields.target;
        self.data.direction = fields.direction;
        self.updated_at = Utc::now();
    }

    pub fn set_target(&mut self, target: Option<f64>) {
        self.data.target = target;
        self.updated_at = Utc::now();
    }

    pub fn points(&self) -> &[DataPoint] {
        &self.data.data_points
    }

    /// Append points in the given order, returning the ids assigned to them.
    pub fn append_points(&mut self, points: &[NewDataPoint]) -> Vec<String> {
        let now = Utc::now();
        let mut ids = Vec::with_capacity(points.len());

        for point in points {
            let id = new_id();
            self.data.data_points.push(DataPoint {
                id: id.clone(),
                value: point.value,
                timestamp: point.timestamp.unwrap_or(now),
            });
            ids.push(id);
        }

        self.updated_at = now;
        ids
    }

    pub fn find_point(&self, point_id: &str) -> Option<&DataPoint> {
        self.data.data_points.iter().find(|p| p.id == point_id)
    }

    /// Overwrite a point's value and timestamp in place.
    pub fn update_point(
        &mut self,
        point_id: &str,
        value: f64,
        timestamp: DateTime<Utc>,
    ) -> Option<&DataPoint> {
        let point = self
            .data
            .data_points
            .iter_mut()
            .find(|p| p.id == point_id)?;
        point.value = value;
        point.timestamp = timestamp;
        self.updated_at = Utc::now();
        Some(point)
    }

    /// Remove a point, keeping the relative order of the rest.
    pub fn remove_point(&mut self, point_id: &str) -> Option<DataPoint> {
        let index = self
            .data
            .data_points
            .iter()
            .position(|p| p.id == point_id)?;
        self.updated_at = Utc::now();
        Some(self.data.data_points.remove(index))
    }
}
