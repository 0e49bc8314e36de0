//! Session lifecycle: logout, refresh, lazy expiry, no resurrection.

mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use chrono::{Duration, Utc};
use common::*;
use identity_service::models::Session;

async fn login_tokens(app: &TestApp, email: &str) -> (String, String) {
    let response = app.login(email, TEST_PASSWORD).await;
    let body = expect_json(response, StatusCode::OK).await;
    (
        body["access_token"].as_str().unwrap().to_string(),
        body["refresh_token"].as_str().unwrap().to_string(),
    )
}

fn logout_request(access_token: &str, refresh_token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/auth/logout")
        .header(header::AUTHORIZATION, format!("Bearer {}", access_token));
    if let Some(token) = refresh_token {
        builder = builder.header("x-refresh-token", token);
    }
    builder.body(Body::empty()).unwrap()
}

fn refresh_request(refresh_token: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/auth/refresh")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(format!(
            r#"{{"refresh_token": "{}"}}"#,
            refresh_token
        )))
        .unwrap()
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn refresh_issues_new_access_token() {
    let app = TestApp::spawn().await;
    let tag = format!("refresh_ok_{}", uuid::Uuid::new_v4().simple());
    let user = create_active_user(app.pool(), &tag).await;

    let (_, refresh_token) = login_tokens(&app, &user.email).await;

    let response = app.request(refresh_request(&refresh_token)).await;
    let body = expect_json(response, StatusCode::OK).await;
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["expires_in"], 15 * 60);
    assert!(body["access_token"].as_str().unwrap().len() > 20);
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn logout_invalidates_and_token_never_resurrects() {
    let app = TestApp::spawn().await;
    let tag = format!("logout_{}", uuid::Uuid::new_v4().simple());
    let user = create_active_user(app.pool(), &tag).await;

    let (access_token, refresh_token) = login_tokens(&app, &user.email).await;

    let response = app
        .request(logout_request(&access_token, Some(&refresh_token)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(count_activity(app.pool(), "logout", &user.username).await, 1);

    // The session row survives with its validity flag cleared.
    let hash = Session::hash_token(&refresh_token);
    let row: (bool,) =
        sqlx::query_as("SELECT is_valid FROM sessions WHERE user_id = $1 AND token_hash = $2")
            .bind(user.id)
            .bind(&hash)
            .fetch_one(app.pool())
            .await
            .unwrap();
    assert!(!row.0);

    // The same refresh token never validates again.
    let response = app.request(refresh_request(&refresh_token)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // A second logout with the same token reports the session gone,
    // identically to a wrong token.
    let response = app
        .request(logout_request(&access_token, Some(&refresh_token)))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn logout_without_refresh_header_is_rejected() {
    let app = TestApp::spawn().await;
    let tag = format!("logout_missing_{}", uuid::Uuid::new_v4().simple());
    let user = create_active_user(app.pool(), &tag).await;

    let (access_token, _) = login_tokens(&app, &user.email).await;

    let response = app.request(logout_request(&access_token, None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn expired_session_fails_lazily_even_with_validity_flag_set() {
    let app = TestApp::spawn().await;
    let tag = format!("expired_{}", uuid::Uuid::new_v4().simple());
    let user = create_active_user(app.pool(), &tag).await;

    let (_, refresh_token) = login_tokens(&app, &user.email).await;

    // Age the session past its expiry; the flag stays true.
    let hash = Session::hash_token(&refresh_token);
    sqlx::query("UPDATE sessions SET expires_at = $1 WHERE user_id = $2 AND token_hash = $3")
        .bind(Utc::now() - Duration::minutes(5))
        .bind(user.id)
        .bind(&hash)
        .execute(app.pool())
        .await
        .unwrap();

    let response = app.request(refresh_request(&refresh_token)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn multiple_concurrent_sessions_are_permitted() {
    let app = TestApp::spawn().await;
    let tag = format!("multi_{}", uuid::Uuid::new_v4().simple());
    let user = create_active_user(app.pool(), &tag).await;

    let (_, first_refresh) = login_tokens(&app, &user.email).await;
    let (_, second_refresh) = login_tokens(&app, &user.email).await;

    // Both sessions validate independently.
    let response = app.request(refresh_request(&first_refresh)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = app.request(refresh_request(&second_refresh)).await;
    assert_eq!(response.status(), StatusCode::OK);
}
