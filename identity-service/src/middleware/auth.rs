use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::models::User;
use crate::services::{database, ServiceError};
use crate::AppState;
use service_core::error::AppError;

/// Resolve the bearer token into a status-checked actor and stash it in the
/// request extensions. Pure read: auditing happens at the call sites that
/// use the resolved actor.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| {
            AppError::Unauthorized(anyhow::anyhow!("Missing or invalid Authorization header"))
        })?;

    let user = resolve_actor(&state, token).await.map_err(AppError::from)?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Turn a bearer token into a resolved, status-checked actor.
pub async fn resolve_actor(state: &AppState, token: &str) -> Result<User, ServiceError> {
    // Expired tokens are reported distinctly from malformed ones.
    let claims = state.jwt.decode(token)?;

    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| ServiceError::TokenInvalid)?;

    let user = database::find_user_by_id(state.db.pool(), user_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("User".to_string()))?;

    if !user.is_active() {
        return Err(ServiceError::Forbidden(format!(
            "User account is {}",
            user.status
        )));
    }

    Ok(user)
}

/// Extractor for the resolved actor in handlers behind `auth_middleware`.
pub struct CurrentUser(pub User);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts.extensions.get::<User>().ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!(
                "Resolved actor missing from request extensions"
            ))
        })?;

        Ok(CurrentUser(user.clone()))
    }
}
