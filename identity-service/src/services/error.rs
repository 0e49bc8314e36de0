use service_core::error::AppError;
use thiserror::Error;

/// Domain error taxonomy. Credential and session failures are deliberately
/// coarse so callers cannot distinguish "no such user" from "wrong password"
/// or "wrong token" from "already logged out".
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account suspended")]
    AccountSuspended,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token")]
    TokenInvalid,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Session not found or already invalidated")]
    SessionNotFound,

    #[error("Refresh token expired")]
    SessionExpired,

    #[error("Refresh token missing from request")]
    MissingToken,

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            // Unique violations are the storage-level serialization point for
            // username/email/phone and the singleton-superuser indexes.
            if db_err.code().as_deref() == Some("23505") {
                return ServiceError::Conflict(format!(
                    "unique constraint violated: {}",
                    db_err.constraint().unwrap_or("unknown")
                ));
            }
        }
        ServiceError::Persistence(err.to_string())
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidCredentials => {
                AppError::AuthError(anyhow::anyhow!("Invalid credentials"))
            }
            ServiceError::AccountSuspended => {
                AppError::Forbidden(anyhow::anyhow!("Account suspended"))
            }
            ServiceError::TokenExpired => {
                AppError::Unauthorized(anyhow::anyhow!("Token has expired"))
            }
            ServiceError::TokenInvalid => {
                AppError::Unauthorized(anyhow::anyhow!("Could not validate credentials"))
            }
            ServiceError::Unauthorized(msg) => AppError::Unauthorized(anyhow::anyhow!(msg)),
            ServiceError::Forbidden(msg) => AppError::Forbidden(anyhow::anyhow!(msg)),
            ServiceError::NotFound(what) => AppError::NotFound(anyhow::anyhow!("{} not found", what)),
            ServiceError::Conflict(msg) => AppError::Conflict(anyhow::anyhow!(msg)),
            ServiceError::SessionNotFound => {
                AppError::NotFound(anyhow::anyhow!("Session not found or already invalidated"))
            }
            ServiceError::SessionExpired => {
                AppError::Unauthorized(anyhow::anyhow!("Invalid or expired refresh token"))
            }
            ServiceError::MissingToken => {
                AppError::BadRequest(anyhow::anyhow!("Refresh token missing from request"))
            }
            ServiceError::Persistence(msg) => AppError::DatabaseError(anyhow::anyhow!(msg)),
            ServiceError::Internal(err) => AppError::InternalError(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_failures_share_one_message() {
        // Unknown email and wrong password both surface as the same error.
        assert_eq!(
            ServiceError::InvalidCredentials.to_string(),
            "Invalid credentials"
        );
    }

    #[test]
    fn session_errors_do_not_leak_which_check_failed() {
        let msg = ServiceError::SessionNotFound.to_string();
        assert!(!msg.contains("token"));
        assert!(!msg.contains("user"));
    }
}
