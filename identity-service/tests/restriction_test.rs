//! Restriction engine over HTTP: singleton superuser, admin protection.

mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use common::*;
use identity_service::models::{Department, StaffRole};
use identity_service::services::database;

fn authed(req: axum::http::request::Builder, token: &str) -> axum::http::request::Builder {
    req.header(header::AUTHORIZATION, format!("Bearer {}", token))
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn creating_a_second_superuser_role_is_a_conflict() {
    let app = TestApp::spawn().await;
    let tag = format!("conflict_su_{}", uuid::Uuid::new_v4().simple());

    let superuser = seeded_superuser(app.pool()).await;
    let token = app.access_token_for(&superuser);

    let candidate = create_active_user(app.pool(), &tag).await;

    // Role alone trips the singleton, department notwithstanding.
    for department in ["operations", "superuser"] {
        let response = app
            .request(
                authed(Request::builder().method("POST").uri("/staff"), &token)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(format!(
                        r#"{{"user_id": "{}", "department": "{}", "role": "superuser"}}"#,
                        candidate.id, department
                    )))
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    // The reserved department is its own independent singleton.
    let response = app
        .request(
            authed(Request::builder().method("POST").uri("/staff"), &token)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(format!(
                    r#"{{"user_id": "{}", "department": "superuser", "role": "admin"}}"#,
                    candidate.id
                )))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn admin_cannot_delete_the_superuser() {
    let app = TestApp::spawn().await;
    let tag = format!("admin_vs_su_{}", uuid::Uuid::new_v4().simple());

    let superuser = seeded_superuser(app.pool()).await;
    let superuser_staff = database::find_staff_by_user_id(app.pool(), superuser.id)
        .await
        .unwrap()
        .unwrap();

    let admin_user = create_active_user(app.pool(), &tag).await;
    let admin_staff = add_staff(
        app.pool(),
        &admin_user,
        Department::Operations,
        StaffRole::Admin,
    )
    .await;
    grant_permission(app.pool(), &admin_staff, "staff:delete").await;

    let token = app.access_token_for(&admin_user);
    let response = app
        .request(
            authed(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/staff/{}", superuser_staff.id)),
                &token,
            )
            .body(Body::empty())
            .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The profile is untouched.
    assert!(database::find_staff_by_id(app.pool(), superuser_staff.id)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn only_the_superuser_manages_admins() {
    let app = TestApp::spawn().await;
    let tag = format!("supp_vs_admin_{}", uuid::Uuid::new_v4().simple());

    let admin_user = create_active_user(app.pool(), &format!("a_{}", tag)).await;
    let admin_staff = add_staff(
        app.pool(),
        &admin_user,
        Department::Operations,
        StaffRole::Admin,
    )
    .await;

    let support_user = create_active_user(app.pool(), &format!("s_{}", tag)).await;
    let support_staff = add_staff(
        app.pool(),
        &support_user,
        Department::Support,
        StaffRole::Support,
    )
    .await;
    grant_permission(app.pool(), &support_staff, "staff:read").await;
    grant_permission(app.pool(), &support_staff, "staff:update").await;

    let token = app.access_token_for(&support_user);

    // Support with staff:read still cannot view an admin profile.
    let response = app
        .request(
            authed(
                Request::builder()
                    .method("GET")
                    .uri(format!("/staff/{}", admin_staff.id)),
                &token,
            )
            .body(Body::empty())
            .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Nor edit it.
    let response = app
        .request(
            authed(
                Request::builder()
                    .method("PUT")
                    .uri(format!("/staff/{}", admin_staff.id)),
                &token,
            )
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"department": "support"}"#))
            .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The superuser can.
    let superuser = seeded_superuser(app.pool()).await;
    let su_token = app.access_token_for(&superuser);
    let response = app
        .request(
            authed(
                Request::builder()
                    .method("GET")
                    .uri(format!("/staff/{}", admin_staff.id)),
                &su_token,
            )
            .body(Body::empty())
            .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn superuser_role_and_department_stay_frozen() {
    let app = TestApp::spawn().await;

    let superuser = seeded_superuser(app.pool()).await;
    let superuser_staff = database::find_staff_by_user_id(app.pool(), superuser.id)
        .await
        .unwrap()
        .unwrap();
    let token = app.access_token_for(&superuser);

    // Even the superuser itself cannot move its own role or department.
    let response = app
        .request(
            authed(
                Request::builder()
                    .method("PUT")
                    .uri(format!("/staff/{}", superuser_staff.id)),
                &token,
            )
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"role": "admin"}"#))
            .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let unchanged = database::find_staff_by_id(app.pool(), superuser_staff.id)
        .await
        .unwrap()
        .unwrap();
    assert!(unchanged.has_superuser_role());
    assert!(unchanged.has_superuser_department());
}
