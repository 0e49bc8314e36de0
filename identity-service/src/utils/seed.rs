//! Startup seeding: permission vocabulary and the singleton superuser.

use sqlx::postgres::PgPool;

use crate::config::SuperuserConfig;
use crate::models::{Department, Permission, StaffProfile, StaffRole, User, UserStatus};
use crate::services::{database, ServiceError};
use crate::utils::{hash_password, Password};

/// Seed the closed permission vocabulary. Idempotent.
pub async fn seed_permissions(pool: &PgPool) -> Result<(), ServiceError> {
    for name in crate::models::PERMISSION_VOCABULARY {
        let permission = Permission::new(name.to_string());
        database::insert_permission(pool, &permission).await?;
    }
    tracing::info!(
        count = crate::models::PERMISSION_VOCABULARY.len(),
        "Permission vocabulary seeded"
    );
    Ok(())
}

/// Seed the singleton superuser with its staff profile and every permission.
/// Idempotent: a no-op when a superuser already exists.
pub async fn seed_superuser(pool: &PgPool, config: &SuperuserConfig) -> Result<(), ServiceError> {
    if database::find_superuser(pool).await?.is_some() {
        tracing::debug!("Superuser already exists, skipping seed");
        return Ok(());
    }

    let password_hash = hash_password(&Password::new(config.password.clone()))
        .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Password hashing error: {}", e)))?;

    let mut user = User::new(
        config.username.clone(),
        config.email.clone(),
        config.phone_number.clone(),
        password_hash.into_string(),
    );
    user.is_verified = true;
    user.is_superuser = true;
    user.status = UserStatus::Active.as_str().to_string();

    let staff = StaffProfile::new(user.id, Department::Superuser, StaffRole::Superuser);

    let mut tx = pool.begin().await.map_err(ServiceError::from)?;

    database::insert_user(&mut *tx, &user).await?;
    database::insert_staff(&mut *tx, &staff).await?;

    for name in crate::models::PERMISSION_VOCABULARY {
        let permission = database::find_permission_by_name(&mut *tx, name)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Permission".to_string()))?;
        database::grant_permission(&mut *tx, staff.id, permission.id).await?;
    }

    tx.commit().await.map_err(ServiceError::from)?;

    tracing::info!(user_id = %user.id, "Superuser seeded");
    Ok(())
}
