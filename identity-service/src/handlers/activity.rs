use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    middleware::{CurrentUser, RequestMeta},
    AppState,
};
use service_core::error::AppError;

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    /// Defaults to the actor's own entries when absent.
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    100
}

/// List activity log entries, newest first
///
/// Reading another user's entries passes the restriction engine's view
/// check between the two staff profiles.
#[utoipa::path(
    get,
    path = "/activity",
    responses(
        (status = 200, description = "Activity entries listed"),
        (status = 403, description = "Restriction denied"),
        (status = 404, description = "User not found")
    ),
    tag = "Activity",
    security(("bearer_auth" = []))
)]
pub async fn list_activity(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    meta: RequestMeta,
    Query(query): Query<ActivityQuery>,
) -> Result<impl IntoResponse, AppError> {
    let res = state
        .activity_service
        .list_for(&actor, query.user_id, query.skip, query.limit, &meta)
        .await?;
    Ok(Json(res))
}
