// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Trax: personal measurement tracks.
//!
//! This crate provides the backend API for users to record numeric tracks
//! (weight, calories, ...) as timestamped data points with an optional
//! target. Each user document owns its tracks and their points, and every
//! write is re-read and verified after it is saved.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::Db;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Db,
}
