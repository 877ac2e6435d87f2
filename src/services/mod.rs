// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod accounts;
pub mod password;
pub mod tracks;

pub use tracks::{GlobalTrackLookup, TrackService};
