use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    handlers::user::ListQuery,
    middleware::{CurrentUser, RequestMeta},
    models::{CreateStaffRequest, StaffResponse, UpdateStaffRequest},
    AppState,
};
use service_core::error::AppError;

#[derive(Debug, Deserialize, ToSchema)]
pub struct PermissionGrantRequest {
    pub permission: String,
}

/// Create a staff profile for a user
#[utoipa::path(
    post,
    path = "/staff",
    request_body = CreateStaffRequest,
    responses(
        (status = 201, description = "Staff profile created", body = StaffResponse),
        (status = 403, description = "Permission or restriction denied"),
        (status = 409, description = "Duplicate staff profile or superuser")
    ),
    tag = "Staff",
    security(("bearer_auth" = []))
)]
pub async fn create_staff(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    meta: RequestMeta,
    Json(req): Json<CreateStaffRequest>,
) -> Result<impl IntoResponse, AppError> {
    let res = state.staff_service.create_staff(&actor, req, &meta).await?;
    Ok((StatusCode::CREATED, Json(res)))
}

/// Get a staff profile
#[utoipa::path(
    get,
    path = "/staff/{staff_id}",
    params(("staff_id" = Uuid, Path, description = "Staff profile id")),
    responses(
        (status = 200, description = "Staff profile", body = StaffResponse),
        (status = 403, description = "Permission or restriction denied"),
        (status = 404, description = "Staff not found")
    ),
    tag = "Staff",
    security(("bearer_auth" = []))
)]
pub async fn get_staff(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    meta: RequestMeta,
    Path(staff_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let res = state.staff_service.get_staff(&actor, staff_id, &meta).await?;
    Ok(Json(res))
}

/// List staff profiles
#[utoipa::path(
    get,
    path = "/staff",
    responses((status = 200, description = "Staff profiles listed")),
    tag = "Staff",
    security(("bearer_auth" = []))
)]
pub async fn list_staff(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    meta: RequestMeta,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let res = state
        .staff_service
        .list_staff(&actor, query.skip, query.limit, &meta)
        .await?;
    Ok(Json(res))
}

/// Update a staff profile's role/department
#[utoipa::path(
    put,
    path = "/staff/{staff_id}",
    params(("staff_id" = Uuid, Path, description = "Staff profile id")),
    request_body = UpdateStaffRequest,
    responses(
        (status = 200, description = "Staff profile updated", body = StaffResponse),
        (status = 403, description = "Permission or restriction denied"),
        (status = 404, description = "Staff not found"),
        (status = 409, description = "Duplicate superuser")
    ),
    tag = "Staff",
    security(("bearer_auth" = []))
)]
pub async fn update_staff(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    meta: RequestMeta,
    Path(staff_id): Path<Uuid>,
    Json(req): Json<UpdateStaffRequest>,
) -> Result<impl IntoResponse, AppError> {
    let res = state
        .staff_service
        .update_staff(&actor, staff_id, req, &meta)
        .await?;
    Ok(Json(res))
}

/// Delete a staff profile
#[utoipa::path(
    delete,
    path = "/staff/{staff_id}",
    params(("staff_id" = Uuid, Path, description = "Staff profile id")),
    responses(
        (status = 204, description = "Staff profile deleted"),
        (status = 403, description = "Permission or restriction denied"),
        (status = 404, description = "Staff not found")
    ),
    tag = "Staff",
    security(("bearer_auth" = []))
)]
pub async fn delete_staff(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    meta: RequestMeta,
    Path(staff_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state
        .staff_service
        .delete_staff(&actor, staff_id, &meta)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Grant a permission to a staff profile
#[utoipa::path(
    post,
    path = "/staff/{staff_id}/permissions",
    params(("staff_id" = Uuid, Path, description = "Staff profile id")),
    request_body = PermissionGrantRequest,
    responses(
        (status = 200, description = "Permission granted", body = StaffResponse),
        (status = 403, description = "Permission or restriction denied"),
        (status = 404, description = "Staff or permission not found")
    ),
    tag = "Staff",
    security(("bearer_auth" = []))
)]
pub async fn assign_permission(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    meta: RequestMeta,
    Path(staff_id): Path<Uuid>,
    Json(req): Json<PermissionGrantRequest>,
) -> Result<impl IntoResponse, AppError> {
    let res = state
        .staff_service
        .assign_permission(&actor, staff_id, &req.permission, &meta)
        .await?;
    Ok(Json(res))
}

/// Revoke a permission from a staff profile
#[utoipa::path(
    delete,
    path = "/staff/{staff_id}/permissions/{permission}",
    params(
        ("staff_id" = Uuid, Path, description = "Staff profile id"),
        ("permission" = String, Path, description = "Permission name")
    ),
    responses(
        (status = 200, description = "Permission revoked", body = StaffResponse),
        (status = 403, description = "Permission or restriction denied"),
        (status = 404, description = "Staff, permission or grant not found")
    ),
    tag = "Staff",
    security(("bearer_auth" = []))
)]
pub async fn revoke_permission(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    meta: RequestMeta,
    Path((staff_id, permission)): Path<(Uuid, String)>,
) -> Result<impl IntoResponse, AppError> {
    let res = state
        .staff_service
        .revoke_permission(&actor, staff_id, &permission, &meta)
        .await?;
    Ok(Json(res))
}
