// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Registration, login and session cookie tests.
//!
//! These tests verify that login hands the token out in the body, the
//! `auth-token` header and the session cookie, and that every one of those
//! is accepted back by the access gate.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
};
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;
use common::{create_test_app, send};

fn set_cookie_headers(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

fn find_cookie(headers: &[String], name: &str) -> String {
    headers
        .iter()
        .find(|value| value.starts_with(&format!("{name}=")))
        .cloned()
        .unwrap_or_else(|| panic!("missing Set-Cookie header for {name}: {headers:?}"))
}

fn registration(email: &str) -> Value {
    json!({
        "name": "Ada",
        "email": email,
        "sex": "f",
        "password": "secret1",
        "password2": "secret1"
    })
}

async fn login(app: &axum::Router, email: &str, password: &str) -> Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/trax/api/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "email": email, "password": password }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn test_register_returns_profile_without_hash() {
    let (app, _) = create_test_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/trax/api/auth/register",
        None,
        Some(registration("Ada@Example.com")),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["email"], "ada@example.com");
    assert_eq!(body["user"]["sex"], "f");
    assert!(body["user"].get("passwordHash").is_none());
}

#[tokio::test]
async fn test_register_rejections() {
    let (app, _) = create_test_app();

    let (status, _) = send(
        &app,
        Method::POST,
        "/trax/api/auth/register",
        None,
        Some(registration("ada@example.com")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        Method::POST,
        "/trax/api/auth/register",
        None,
        Some(registration("ADA@example.com")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "already_exists");

    let mut mismatch = registration("bob@example.com");
    mismatch["password2"] = json!("secret2");
    let (status, body) = send(
        &app,
        Method::POST,
        "/trax/api/auth/register",
        None,
        Some(mismatch),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_failed");

    let mut bad_sex = registration("bob@example.com");
    bad_sex["sex"] = json!("x");
    let (status, _) = send(
        &app,
        Method::POST,
        "/trax/api/auth/register",
        None,
        Some(bad_sex),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/trax/api/auth/register",
        None,
        Some(registration("not-an-email")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_sets_cookie_and_header() {
    let (app, _) = create_test_app();
    send(
        &app,
        Method::POST,
        "/trax/api/auth/register",
        None,
        Some(registration("ada@example.com")),
    )
    .await;

    let response = login(&app, "ada@example.com", "secret1").await;
    assert_eq!(response.status(), StatusCode::OK);

    let header_token = response
        .headers()
        .get("auth-token")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();

    let set_cookies = set_cookie_headers(&response);
    let token_cookie = find_cookie(&set_cookies, "trax_token");
    assert!(token_cookie.contains("Path=/"));
    assert!(token_cookie.contains("HttpOnly"));
    assert!(token_cookie.contains("Secure"));
    assert!(token_cookie.contains("SameSite=Lax"));
    assert!(token_cookie.contains("Max-Age="));
    assert!(token_cookie.starts_with(&format!("trax_token={}", header_token)));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["token"], header_token.as_str());
    assert_eq!(body["user"]["email"], "ada@example.com");
}

#[tokio::test]
async fn test_login_failures() {
    let (app, _) = create_test_app();
    send(
        &app,
        Method::POST,
        "/trax/api/auth/register",
        None,
        Some(registration("ada@example.com")),
    )
    .await;

    let response = login(&app, "ada@example.com", "wrong-password").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookie_headers(&response).is_empty());

    let response = login(&app, "nobody@example.com", "secret1").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cookie_authenticates_requests() {
    let (app, _) = create_test_app();
    send(
        &app,
        Method::POST,
        "/trax/api/auth/register",
        None,
        Some(registration("ada@example.com")),
    )
    .await;
    let response = login(&app, "ada@example.com", "secret1").await;
    let token = response
        .headers()
        .get("auth-token")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/trax/api/users/me")
                .header(header::COOKIE, format!("trax_token={}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, body) = send(
        &app,
        Method::POST,
        "/trax/api/auth/authenticate_token",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token"], token.as_str());
    assert_eq!(body["user"]["email"], "ada@example.com");
}

#[tokio::test]
async fn test_authenticate_token_without_token() {
    let (app, _) = create_test_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/trax/api/auth/authenticate_token",
        None,
        None,
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "missing_credential");
}
