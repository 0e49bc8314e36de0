//! Authentication service: credential verification, token issuance, session
//! lifecycle.

use sqlx::postgres::PgConnection;

use crate::middleware::RequestMeta;
use crate::models::{LoginResponse, RefreshResponse, Session, User};
use crate::services::{database, ActivityLogger, Database, JwtService, ServiceError};
use crate::utils::{verify_password, Password, PasswordHashString};
use uuid::Uuid;

#[derive(Clone)]
pub struct AuthService {
    db: Database,
    jwt: JwtService,
}

impl AuthService {
    pub fn new(db: Database, jwt: JwtService) -> Self {
        Self { db, jwt }
    }

    /// Verify credentials. Unknown email and wrong password produce the same
    /// error; a suspended account is reported distinctly. Every outcome
    /// writes exactly one audit record.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
        meta: &RequestMeta,
    ) -> Result<User, ServiceError> {
        let mut conn = self.db.pool().acquire().await.map_err(ServiceError::from)?;
        Self::authenticate_on(&mut conn, email, password, meta).await
    }

    /// Credential check against the given connection. Callers inside a
    /// transaction get the audit record in that transaction.
    async fn authenticate_on(
        conn: &mut PgConnection,
        email: &str,
        password: &str,
        meta: &RequestMeta,
    ) -> Result<User, ServiceError> {
        let user = database::find_user_by_email(&mut *conn, email).await?;

        let user = match user {
            Some(user)
                if verify_password(
                    &Password::new(password.to_string()),
                    &PasswordHashString::new(user.password_hash.clone()),
                ) =>
            {
                user
            }
            _ => {
                // The audit trail keeps the specific address; the response
                // stays uniform for both unknown email and wrong password.
                ActivityLogger::record(
                    &mut *conn,
                    None,
                    None,
                    "login_failed",
                    meta,
                    &[("email", email)],
                )
                .await?;
                return Err(ServiceError::InvalidCredentials);
            }
        };

        if user.is_suspended() {
            ActivityLogger::record(&mut *conn, Some(&user), None, "login_blocked", meta, &[])
                .await?;
            return Err(ServiceError::AccountSuspended);
        }

        ActivityLogger::record(&mut *conn, Some(&user), None, "login", meta, &[]).await?;

        tracing::info!(user_id = %user.id, "User authenticated");
        Ok(user)
    }

    /// Authenticate, issue a token pair, and create the session. The session
    /// row and the login audit record commit in one transaction.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        meta: &RequestMeta,
    ) -> Result<LoginResponse, ServiceError> {
        let mut tx = self.db.pool().begin().await.map_err(ServiceError::from)?;

        let user = match Self::authenticate_on(&mut tx, email, password, meta).await {
            Ok(user) => user,
            Err(err) => {
                // The attempt failed before any mutation; commit so the
                // failure audit survives.
                tx.commit().await.map_err(ServiceError::from)?;
                return Err(err);
            }
        };

        let access_token = self.jwt.issue_access_token(user.id)?;
        let refresh_token = self.jwt.issue_refresh_token(user.id)?;

        let session = Session::new(
            user.id,
            &refresh_token,
            self.jwt.refresh_token_expiry_days(),
            meta.user_agent.clone(),
            meta.ip_address.clone(),
        );
        database::insert_session(&mut *tx, &session).await?;

        tx.commit().await.map_err(ServiceError::from)?;

        tracing::info!(user_id = %user.id, session_id = %session.id, "User logged in");

        Ok(LoginResponse {
            user: user.sanitized(),
            access_token,
            refresh_token,
            token_type: "bearer".to_string(),
        })
    }

    /// Invalidate the session matching the supplied refresh token. The actor
    /// must already be resolved from a valid access token.
    pub async fn logout(
        &self,
        actor: &User,
        refresh_token: Option<&str>,
        meta: &RequestMeta,
    ) -> Result<(), ServiceError> {
        let Some(refresh_token) = refresh_token else {
            return Err(ServiceError::MissingToken);
        };

        let mut tx = self.db.pool().begin().await.map_err(ServiceError::from)?;

        let token_hash = Session::hash_token(refresh_token);
        let affected = database::invalidate_session(&mut *tx, actor.id, &token_hash).await?;

        if affected == 0 {
            ActivityLogger::record(&mut tx, Some(actor), None, "logout_failed", meta, &[]).await?;
            tx.commit().await.map_err(ServiceError::from)?;
            return Err(ServiceError::SessionNotFound);
        }

        ActivityLogger::record(&mut tx, Some(actor), None, "logout", meta, &[]).await?;
        tx.commit().await.map_err(ServiceError::from)?;

        tracing::info!(user_id = %actor.id, "User logged out");
        Ok(())
    }

    /// Exchange a refresh token for a new access token. The session must
    /// exist, hold its validity flag, and not be past expiry (expiry is
    /// checked lazily here, there is no background sweep). The refresh token
    /// is not rotated.
    pub async fn refresh(
        &self,
        refresh_token: &str,
        meta: &RequestMeta,
    ) -> Result<RefreshResponse, ServiceError> {
        let claims = self.jwt.decode(refresh_token)?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| ServiceError::TokenInvalid)?;

        let token_hash = Session::hash_token(refresh_token);
        let session = database::find_active_session(self.db.pool(), user_id, &token_hash)
            .await?
            .ok_or(ServiceError::SessionNotFound)?;

        if session.is_expired() {
            return Err(ServiceError::SessionExpired);
        }

        let user = database::find_user_by_id(self.db.pool(), user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User".to_string()))?;

        if !user.is_active() {
            return Err(ServiceError::Forbidden(format!(
                "User account is {}",
                user.status
            )));
        }

        let access_token = self.jwt.issue_access_token(user.id)?;

        let mut conn = self.db.pool().acquire().await.map_err(ServiceError::from)?;
        ActivityLogger::record(&mut conn, Some(&user), None, "token_refresh", meta, &[]).await?;

        Ok(RefreshResponse {
            access_token,
            token_type: "bearer".to_string(),
            expires_in: self.jwt.access_token_expiry_seconds(),
        })
    }
}
