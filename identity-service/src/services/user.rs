//! User service: account CRUD with superuser protection rules. Every path
//! is audited; success audits commit atomically with the mutation.

use crate::middleware::RequestMeta;
use crate::models::{CreateUserRequest, UpdateUserRequest, User, UserResponse};
use crate::services::{
    database, permission::require_permission, ActivityLogger, Database, ServiceError,
};
use crate::utils::{hash_password, Password};
use uuid::Uuid;

#[derive(Clone)]
pub struct UserService {
    db: Database,
}

impl UserService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Record an `*_error` audit entry for an unexpected internal failure.
    /// Best effort: the original failure is what surfaces to the caller.
    async fn with_error_audit<T>(
        &self,
        actor: &User,
        error_type: &str,
        meta: &RequestMeta,
        result: Result<T, ServiceError>,
    ) -> Result<T, ServiceError> {
        if let Err(err) = &result {
            if matches!(
                err,
                ServiceError::Persistence(_) | ServiceError::Internal(_)
            ) {
                if let Ok(mut conn) = self.db.pool().acquire().await {
                    let text = err.to_string();
                    let _ = ActivityLogger::record(
                        &mut conn,
                        Some(actor),
                        None,
                        error_type,
                        meta,
                        &[("error", &text)],
                    )
                    .await;
                }
            }
        }
        result
    }

    pub async fn create_user(
        &self,
        actor: &User,
        req: CreateUserRequest,
        meta: &RequestMeta,
    ) -> Result<UserResponse, ServiceError> {
        let result = self.create_user_inner(actor, req, meta).await;
        self.with_error_audit(actor, "user:create_error", meta, result)
            .await
    }

    async fn create_user_inner(
        &self,
        actor: &User,
        req: CreateUserRequest,
        meta: &RequestMeta,
    ) -> Result<UserResponse, ServiceError> {
        require_permission(&self.db, actor, "user:create", meta).await?;

        if req.is_superuser {
            let mut conn = self.db.pool().acquire().await.map_err(ServiceError::from)?;
            ActivityLogger::record(
                &mut conn,
                Some(actor),
                None,
                "user:create_denied",
                meta,
                &[("reason", "attempt to create superuser")],
            )
            .await?;
            return Err(ServiceError::Forbidden(
                "Cannot create another superuser".to_string(),
            ));
        }

        let password_hash = hash_password(&Password::new(req.password.clone()))
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Password hashing error: {}", e)))?;

        let mut tx = self.db.pool().begin().await.map_err(ServiceError::from)?;

        // Read-check-then-write stays inside one transaction; the unique
        // indexes serialize concurrent writers.
        if database::find_user_by_username(&mut *tx, &req.username)
            .await?
            .is_some()
        {
            tx.commit().await.map_err(ServiceError::from)?;
            return Err(ServiceError::Conflict("Username already taken".to_string()));
        }
        if database::find_user_by_email(&mut *tx, &req.email)
            .await?
            .is_some()
        {
            tx.commit().await.map_err(ServiceError::from)?;
            return Err(ServiceError::Conflict(
                "Email already registered".to_string(),
            ));
        }
        if database::find_user_by_phone(&mut *tx, &req.phone_number)
            .await?
            .is_some()
        {
            tx.commit().await.map_err(ServiceError::from)?;
            return Err(ServiceError::Conflict(
                "Phone number already registered".to_string(),
            ));
        }

        let user = User::new(
            req.username,
            req.email,
            req.phone_number,
            password_hash.into_string(),
        );
        database::insert_user(&mut *tx, &user).await?;

        ActivityLogger::record(&mut tx, Some(actor), Some(&user), "user:create", meta, &[])
            .await?;

        tx.commit().await.map_err(ServiceError::from)?;

        tracing::info!(user_id = %user.id, "User created");
        Ok(user.sanitized())
    }

    pub async fn get_user(
        &self,
        actor: &User,
        user_id: Uuid,
        meta: &RequestMeta,
    ) -> Result<UserResponse, ServiceError> {
        let result = self.get_user_inner(actor, user_id, meta).await;
        self.with_error_audit(actor, "user:read_error", meta, result)
            .await
    }

    async fn get_user_inner(
        &self,
        actor: &User,
        user_id: Uuid,
        meta: &RequestMeta,
    ) -> Result<UserResponse, ServiceError> {
        require_permission(&self.db, actor, "user:read", meta).await?;

        let user = database::find_user_by_id(self.db.pool(), user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User".to_string()))?;

        let mut conn = self.db.pool().acquire().await.map_err(ServiceError::from)?;

        if user.is_superuser && user.id != actor.id {
            ActivityLogger::record(
                &mut conn,
                Some(actor),
                None,
                "user:read_denied",
                meta,
                &[("target", &user.username)],
            )
            .await?;
            return Err(ServiceError::Forbidden(
                "Superuser cannot be viewed by other users".to_string(),
            ));
        }

        ActivityLogger::record(&mut conn, Some(actor), Some(&user), "user:read", meta, &[])
            .await?;

        Ok(user.sanitized())
    }

    pub async fn list_users(
        &self,
        actor: &User,
        skip: i64,
        limit: i64,
        meta: &RequestMeta,
    ) -> Result<Vec<UserResponse>, ServiceError> {
        let result = self.list_users_inner(actor, skip, limit, meta).await;
        self.with_error_audit(actor, "user:list_error", meta, result)
            .await
    }

    async fn list_users_inner(
        &self,
        actor: &User,
        skip: i64,
        limit: i64,
        meta: &RequestMeta,
    ) -> Result<Vec<UserResponse>, ServiceError> {
        require_permission(&self.db, actor, "user:list", meta).await?;

        let users = database::list_users(self.db.pool(), skip, limit).await?;

        let mut conn = self.db.pool().acquire().await.map_err(ServiceError::from)?;
        let count = users.len().to_string();
        ActivityLogger::record(
            &mut conn,
            Some(actor),
            None,
            "user:list",
            meta,
            &[("count", &count)],
        )
        .await?;

        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    /// Update a user. Self-updates need no staff permission; updating anyone
    /// else requires `user:update`. The superuser record can only be touched
    /// by the superuser itself.
    pub async fn update_user(
        &self,
        actor: &User,
        user_id: Uuid,
        req: UpdateUserRequest,
        meta: &RequestMeta,
    ) -> Result<UserResponse, ServiceError> {
        let result = self.update_user_inner(actor, user_id, req, meta).await;
        self.with_error_audit(actor, "user:update_error", meta, result)
            .await
    }

    async fn update_user_inner(
        &self,
        actor: &User,
        user_id: Uuid,
        req: UpdateUserRequest,
        meta: &RequestMeta,
    ) -> Result<UserResponse, ServiceError> {
        let self_update = actor.id == user_id;
        if !self_update {
            require_permission(&self.db, actor, "user:update", meta).await?;
        }

        let mut user = database::find_user_by_id(self.db.pool(), user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User".to_string()))?;

        if user.is_superuser && !self_update {
            let mut conn = self.db.pool().acquire().await.map_err(ServiceError::from)?;
            ActivityLogger::record(
                &mut conn,
                Some(actor),
                None,
                "user:update_denied",
                meta,
                &[("target", &user.username)],
            )
            .await?;
            return Err(ServiceError::Forbidden(
                "Only the superuser can edit their own account".to_string(),
            ));
        }

        let mut tx = self.db.pool().begin().await.map_err(ServiceError::from)?;

        if let Some(ref username) = req.username {
            if username != &user.username
                && database::find_user_by_username(&mut *tx, username)
                    .await?
                    .is_some()
            {
                tx.commit().await.map_err(ServiceError::from)?;
                return Err(ServiceError::Conflict("Username already taken".to_string()));
            }
        }
        if let Some(ref email) = req.email {
            if email != &user.email
                && database::find_user_by_email(&mut *tx, email).await?.is_some()
            {
                tx.commit().await.map_err(ServiceError::from)?;
                return Err(ServiceError::Conflict(
                    "Email already registered".to_string(),
                ));
            }
        }
        if let Some(ref phone) = req.phone_number {
            if phone != &user.phone_number
                && database::find_user_by_phone(&mut *tx, phone).await?.is_some()
            {
                tx.commit().await.map_err(ServiceError::from)?;
                return Err(ServiceError::Conflict(
                    "Phone number already registered".to_string(),
                ));
            }
        }

        if let Some(username) = req.username {
            user.username = username;
        }
        if let Some(email) = req.email {
            user.email = email;
        }
        if let Some(phone) = req.phone_number {
            user.phone_number = phone;
        }
        if let Some(password) = req.password {
            user.password_hash = hash_password(&Password::new(password))
                .map_err(|e| {
                    ServiceError::Internal(anyhow::anyhow!("Password hashing error: {}", e))
                })?
                .into_string();
        }
        if let Some(is_verified) = req.is_verified {
            user.is_verified = is_verified;
        }
        if let Some(status) = req.status {
            user.status = status.as_str().to_string();
        }
        if let Some(twofa_secret) = req.twofa_secret {
            user.twofa_secret = Some(twofa_secret);
        }

        database::update_user(&mut *tx, &user).await?;

        ActivityLogger::record(&mut tx, Some(actor), Some(&user), "user:update", meta, &[])
            .await?;

        tx.commit().await.map_err(ServiceError::from)?;

        tracing::info!(user_id = %user.id, "User updated");
        Ok(user.sanitized())
    }

    pub async fn delete_user(
        &self,
        actor: &User,
        user_id: Uuid,
        meta: &RequestMeta,
    ) -> Result<(), ServiceError> {
        let result = self.delete_user_inner(actor, user_id, meta).await;
        self.with_error_audit(actor, "user:delete_error", meta, result)
            .await
    }

    async fn delete_user_inner(
        &self,
        actor: &User,
        user_id: Uuid,
        meta: &RequestMeta,
    ) -> Result<(), ServiceError> {
        require_permission(&self.db, actor, "user:delete", meta).await?;

        let user = database::find_user_by_id(self.db.pool(), user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User".to_string()))?;

        if user.is_superuser && user.id != actor.id {
            let mut conn = self.db.pool().acquire().await.map_err(ServiceError::from)?;
            ActivityLogger::record(
                &mut conn,
                Some(actor),
                None,
                "user:delete_denied",
                meta,
                &[("target", &user.username)],
            )
            .await?;
            return Err(ServiceError::Forbidden(
                "Superuser cannot be deleted by others".to_string(),
            ));
        }

        let mut tx = self.db.pool().begin().await.map_err(ServiceError::from)?;

        database::delete_user(&mut *tx, user.id).await?;

        // The target row is gone inside this transaction; its name is kept
        // in the description fields.
        ActivityLogger::record(
            &mut tx,
            Some(actor),
            None,
            "user:delete",
            meta,
            &[("target", &user.username)],
        )
        .await?;

        tx.commit().await.map_err(ServiceError::from)?;

        tracing::info!(user_id = %user.id, "User deleted");
        Ok(())
    }
}
