use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    middleware::{CurrentUser, RequestMeta},
    models::{CreateUserRequest, UpdateUserRequest, UserResponse},
    utils::ValidatedJson,
    AppState,
};
use service_core::error::AppError;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    100
}

/// Create a user
#[utoipa::path(
    post,
    path = "/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 403, description = "Permission denied"),
        (status = 409, description = "Username, email or phone already taken")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
pub async fn create_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    meta: RequestMeta,
    ValidatedJson(req): ValidatedJson<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let res = state.user_service.create_user(&actor, req, &meta).await?;
    Ok((StatusCode::CREATED, Json(res)))
}

/// Get the authenticated user's own record
#[utoipa::path(
    get,
    path = "/users/me",
    responses((status = 200, description = "Current user", body = UserResponse)),
    tag = "Users",
    security(("bearer_auth" = []))
)]
pub async fn get_me(CurrentUser(actor): CurrentUser) -> impl IntoResponse {
    Json(actor.sanitized())
}

/// Update the authenticated user's own record
#[utoipa::path(
    patch,
    path = "/users/me",
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 409, description = "Username, email or phone already taken")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
pub async fn update_me(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    meta: RequestMeta,
    ValidatedJson(req): ValidatedJson<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let res = state
        .user_service
        .update_user(&actor, actor.id, req, &meta)
        .await?;
    Ok(Json(res))
}

/// Get a user by id
#[utoipa::path(
    get,
    path = "/users/{user_id}",
    params(("user_id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "User not found")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
pub async fn get_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    meta: RequestMeta,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let res = state.user_service.get_user(&actor, user_id, &meta).await?;
    Ok(Json(res))
}

/// List users
#[utoipa::path(
    get,
    path = "/users",
    responses((status = 200, description = "Users listed")),
    tag = "Users",
    security(("bearer_auth" = []))
)]
pub async fn list_users(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    meta: RequestMeta,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let res = state
        .user_service
        .list_users(&actor, query.skip, query.limit, &meta)
        .await?;
    Ok(Json(res))
}

/// Update a user by id
#[utoipa::path(
    put,
    path = "/users/{user_id}",
    params(("user_id" = Uuid, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "User not found")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
pub async fn update_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    meta: RequestMeta,
    Path(user_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let res = state
        .user_service
        .update_user(&actor, user_id, req, &meta)
        .await?;
    Ok(Json(res))
}

/// Delete a user by id
#[utoipa::path(
    delete,
    path = "/users/{user_id}",
    params(("user_id" = Uuid, Path, description = "User id")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "User not found")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
pub async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    meta: RequestMeta,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state
        .user_service
        .delete_user(&actor, user_id, &meta)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
