// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod track;
pub mod user;

pub use track::{DataPoint, Direction, NewDataPoint, Track, TrackData, TrackFields};
pub use user::{Sex, User, UserProfile, UserWithTracks};
