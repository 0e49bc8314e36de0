use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};

use crate::{
    middleware::{CurrentUser, RequestMeta},
    models::{LoginRequest, LoginResponse, RefreshRequest, RefreshResponse},
    utils::ValidatedJson,
    AppState,
};
use service_core::error::AppError;

/// Refresh tokens travel out-of-band in this header on logout.
pub const REFRESH_TOKEN_HEADER: &str = "x-refresh-token";

/// Login with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account suspended"),
        (status = 422, description = "Validation error"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Authentication"
)]
pub async fn login(
    State(state): State<AppState>,
    meta: RequestMeta,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let res = state
        .auth_service
        .login(&req.email, &req.password, &meta)
        .await?;
    Ok((StatusCode::OK, Json(res)))
}

/// Logout and invalidate the session
///
/// The actor comes from the bearer access token; the refresh token to
/// invalidate is supplied in the `x-refresh-token` header.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logged out successfully"),
        (status = 400, description = "Refresh token missing"),
        (status = 401, description = "Invalid token"),
        (status = 404, description = "Session not found")
    ),
    tag = "Authentication",
    security(("bearer_auth" = []))
)]
pub async fn logout(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    meta: RequestMeta,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let refresh_token = headers
        .get(REFRESH_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok());

    state
        .auth_service
        .logout(&actor, refresh_token, &meta)
        .await?;

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "message": "Logged out successfully"
        })),
    ))
}

/// Exchange a refresh token for a new access token
#[utoipa::path(
    post,
    path = "/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Token refreshed successfully", body = RefreshResponse),
        (status = 401, description = "Invalid or expired refresh token"),
        (status = 404, description = "Session not found")
    ),
    tag = "Authentication"
)]
pub async fn refresh(
    State(state): State<AppState>,
    meta: RequestMeta,
    Json(req): Json<RefreshRequest>,
) -> Result<impl IntoResponse, AppError> {
    let res = state.auth_service.refresh(&req.refresh_token, &meta).await?;
    Ok((StatusCode::OK, Json(res)))
}
