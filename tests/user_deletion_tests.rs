// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Integration tests for account deletion.

use axum::http::{Method, StatusCode};
use serde_json::json;
use trax::db::UserStore;

mod common;
use common::{create_test_app, seed_user, send};

#[tokio::test]
async fn test_delete_account_removes_tracks_and_frees_email() {
    let (app, state) = create_test_app();
    let (user, token) = seed_user(&state, "gone@x.com").await;

    // 1. Create a track with points
    let (_, body) = send(
        &app,
        Method::POST,
        "/trax/api/tracks",
        Some(&token),
        Some(json!({
            "name": "Weight",
            "type": "weight",
            "data": { "metric": "kg", "target": null, "increaseOrDecrease": null }
        })),
    )
    .await;
    let track_id = body["track"]["id"].as_str().unwrap().to_string();
    send(
        &app,
        Method::POST,
        &format!("/trax/api/tracks/{}", track_id),
        Some(&token),
        Some(json!({ "dataPoints": [{ "value": 1 }] })),
    )
    .await;

    // 2. Delete the account
    let (status, body) = send(&app, Method::DELETE, "/trax/api/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    // 3. Everything is gone
    assert!(state.db.get_user(&user.id).await.unwrap().is_none());
    assert!(state
        .db
        .find_user_by_track(&track_id)
        .await
        .unwrap()
        .is_none());
    assert!(state
        .db
        .find_user_by_email("gone@x.com")
        .await
        .unwrap()
        .is_none());

    // 4. The old token no longer names a user
    let (status, body) = send(&app, Method::GET, "/trax/api/tracks", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "subject_not_found");

    // 5. The email can be registered again
    let (status, _) = send(
        &app,
        Method::POST,
        "/trax/api/auth/register",
        None,
        Some(json!({
            "name": "Again",
            "email": "gone@x.com",
            "sex": "m",
            "password": "secret1",
            "password2": "secret1"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}
