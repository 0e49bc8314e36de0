//! Audit pipeline: permission gate scenario, denial records, trail access.

mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use common::*;
use identity_service::models::{Department, StaffRole};

fn get(uri: String, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn permitted_read_succeeds_with_one_audit_entry() {
    let app = TestApp::spawn().await;
    let tag = format!("audit_ok_{}", uuid::Uuid::new_v4().simple());

    // User A: support staff holding user:read.
    let reader = create_active_user(app.pool(), &format!("a_{}", tag)).await;
    let reader_staff = add_staff(
        app.pool(),
        &reader,
        Department::Support,
        StaffRole::Support,
    )
    .await;
    grant_permission(app.pool(), &reader_staff, "user:read").await;

    // User B: a plain user.
    let target = create_active_user(app.pool(), &format!("b_{}", tag)).await;

    let token = app.access_token_for(&reader);
    let response = app
        .request(get(format!("/users/{}", target.id), &token))
        .await;
    let body = expect_json(response, StatusCode::OK).await;
    assert_eq!(body["id"], target.id.to_string());

    // Exactly one user:read entry naming both actor and target.
    assert_eq!(
        count_activity(app.pool(), "user:read", &target.username).await,
        1
    );
    assert_eq!(
        count_activity(app.pool(), "permission_denied", &reader.username).await,
        0
    );
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn unpermitted_read_is_denied_and_audited_without_leaking_data() {
    let app = TestApp::spawn().await;
    let tag = format!("audit_deny_{}", uuid::Uuid::new_v4().simple());

    // User C: support staff WITHOUT user:read.
    let reader = create_active_user(app.pool(), &format!("c_{}", tag)).await;
    add_staff(
        app.pool(),
        &reader,
        Department::Support,
        StaffRole::Support,
    )
    .await;

    let target = create_active_user(app.pool(), &format!("d_{}", tag)).await;

    let token = app.access_token_for(&reader);
    let response = app
        .request(get(format!("/users/{}", target.id), &token))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = response_json(response).await;

    // No target data in the denial response.
    assert!(!body.to_string().contains(&target.username));

    // One denial record for the gate failure.
    assert_eq!(
        count_activity(app.pool(), "permission_denied", &reader.username).await,
        1
    );
    assert_eq!(
        count_activity(app.pool(), "user:read", &target.username).await,
        0
    );
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn non_staff_caller_is_rejected_at_the_gate() {
    let app = TestApp::spawn().await;
    let tag = format!("audit_nostaff_{}", uuid::Uuid::new_v4().simple());

    let caller = create_active_user(app.pool(), &format!("n_{}", tag)).await;
    let target = create_active_user(app.pool(), &format!("t_{}", tag)).await;

    let token = app.access_token_for(&caller);
    let response = app
        .request(get(format!("/users/{}", target.id), &token))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    assert_eq!(
        count_activity(app.pool(), "permission_denied", &caller.username).await,
        1
    );
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn own_activity_is_readable_but_admins_trail_is_restricted() {
    let app = TestApp::spawn().await;
    let tag = format!("audit_trail_{}", uuid::Uuid::new_v4().simple());

    let support_user = create_active_user(app.pool(), &format!("s_{}", tag)).await;
    add_staff(
        app.pool(),
        &support_user,
        Department::Support,
        StaffRole::Support,
    )
    .await;

    let admin_user = create_active_user(app.pool(), &format!("a_{}", tag)).await;
    add_staff(
        app.pool(),
        &admin_user,
        Department::Operations,
        StaffRole::Admin,
    )
    .await;

    // Generate some history for the support user.
    let response = app.login(&support_user.email, TEST_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);

    let token = app.access_token_for(&support_user);

    // Own entries: allowed, newest first.
    let response = app.request(get("/activity".to_string(), &token)).await;
    let body = expect_json(response, StatusCode::OK).await;
    let entries = body.as_array().unwrap();
    assert!(!entries.is_empty());
    assert_eq!(entries[0]["activity_type"], "login");

    // Another staff member's trail: blocked by the restriction engine
    // (support may not view an admin).
    let response = app
        .request(get(format!("/activity?user_id={}", admin_user.id), &token))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
