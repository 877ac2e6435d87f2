// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running.
//! Run with FIRESTORE_EMULATOR_HOST pointing at a local emulator.
//!
//! The emulator provides a clean state for each test run.

use trax::db::UserStore;
use trax::error::AppError;
use trax::models::{Direction, NewDataPoint, Sex, TrackFields, User};
use trax::services::TrackService;

mod common;
use common::test_db;

/// Unique email for test isolation.
fn unique_email() -> String {
    format!("{}@example.com", uuid::Uuid::new_v4())
}

fn test_user() -> User {
    User::new("Test".to_string(), &unique_email(), Sex::Female, "hash".to_string())
}

fn weight() -> TrackFields {
    TrackFields {
        name: "Weight".to_string(),
        kind: "weight".to_string(),
        metric: "kg".to_string(),
        target: Some(70.0),
        direction: Direction::Decrease,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// USER TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_new_user_creation() {
    require_emulator!();

    let db = test_db().await;
    let user = test_user();

    // Initially, user should not exist
    let before = db.get_user(&user.id).await.unwrap();
    assert!(before.is_none(), "User should not exist before creation");

    db.create_user(&user).await.unwrap();

    let after = db.get_user(&user.id).await.unwrap().expect("User should exist");
    assert_eq!(after.email, user.email);
    assert_eq!(after.version, 0);

    let by_email = db
        .find_user_by_email(&user.email.to_uppercase())
        .await
        .unwrap()
        .expect("Lookup by email should be case-insensitive");
    assert_eq!(by_email.id, user.id);
}

#[tokio::test]
async fn test_duplicate_email_rejected() {
    require_emulator!();

    let db = test_db().await;
    let user = test_user();
    db.create_user(&user).await.unwrap();

    let twin = User::new("Twin".to_string(), &user.email, Sex::Male, "hash".to_string());
    let err = db.create_user(&twin).await.unwrap_err();
    assert!(matches!(err, AppError::Duplicate(_)));
}

#[tokio::test]
async fn test_delete_user() {
    require_emulator!();

    let db = test_db().await;
    let user = test_user();
    db.create_user(&user).await.unwrap();

    assert!(db.delete_user(&user.id).await.unwrap());
    assert!(db.get_user(&user.id).await.unwrap().is_none());
    assert!(!db.delete_user(&user.id).await.unwrap());
}

// ═══════════════════════════════════════════════════════════════════════════
// TRACK TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_track_lookup_by_id() {
    require_emulator!();

    let db = test_db().await;
    let user = test_user();
    db.create_user(&user).await.unwrap();

    let track = TrackService::new(&db)
        .create_track(user.clone(), weight())
        .await
        .unwrap();

    let owner = db
        .find_user_by_track(&track.id)
        .await
        .unwrap()
        .expect("Track owner should be found");
    assert_eq!(owner.id, user.id);
    assert_eq!(owner.track_ids, vec![track.id.clone()]);
}

#[tokio::test]
async fn test_points_persist() {
    require_emulator!();

    let db = test_db().await;
    let user = test_user();
    db.create_user(&user).await.unwrap();
    let service = TrackService::new(&db);

    let track = service.create_track(user.clone(), weight()).await.unwrap();
    let reloaded = db.get_user(&user.id).await.unwrap().unwrap();
    let points = [NewDataPoint {
        value: 80.5,
        timestamp: None,
    }];
    let track = service
        .append_points(reloaded, &track.id, &points)
        .await
        .unwrap();

    let stored = db.get_user(&user.id).await.unwrap().unwrap();
    let stored_track = stored.find_track(&track.id).unwrap();
    assert_eq!(stored_track.points().len(), 1);
    assert_eq!(stored_track.points()[0].value, 80.5);
    assert_eq!(stored.version, 2);
}

#[tokio::test]
async fn test_stale_save_conflicts() {
    require_emulator!();

    let db = test_db().await;
    let user = test_user();
    db.create_user(&user).await.unwrap();

    let mut first = user.clone();
    first.version = 1;
    db.save_user(&first, 0).await.unwrap();

    let mut second = user.clone();
    second.version = 1;
    let err = db.save_user(&second, 0).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_concurrent_saves_have_one_winner() {
    require_emulator!();

    let db = test_db().await;
    let user = test_user();
    db.create_user(&user).await.unwrap();

    // Every writer starts from version 0
    let mut handles = Vec::new();
    for i in 0..8 {
        let db = db.clone();
        let mut copy = user.clone();
        copy.name = format!("writer-{}", i);
        copy.version = 1;
        handles.push(tokio::spawn(async move {
            let result = db.save_user(&copy, 0).await;
            (copy.name, result)
        }));
    }

    let mut winners = Vec::new();
    for handle in handles {
        let (name, result) = handle.await.unwrap();
        match result {
            Ok(()) => winners.push(name),
            Err(AppError::Conflict(_)) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert!(winners.len() <= 1, "more than one save won: {winners:?}");

    let stored = db.get_user(&user.id).await.unwrap().unwrap();
    match winners.first() {
        Some(name) => {
            assert_eq!(&stored.name, name);
            assert_eq!(stored.version, 1);
        }
        None => assert_eq!(stored.version, 0),
    }
}
