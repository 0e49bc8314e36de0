//! PostgreSQL access layer.
//!
//! Single-row lookups take any `PgExecutor` so they run against the pool or
//! inside an open transaction. Mutations that must commit atomically with
//! their audit record are invoked with the caller's transaction connection.

use sqlx::postgres::PgPool;
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::{ActivityLog, Permission, Session, StaffProfile, User};
use crate::services::ServiceError;

/// PostgreSQL database wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database wrapper from a connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Health check - ping the database.
    pub async fn health_check(&self) -> Result<(), ServiceError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

// ==================== User Operations ====================

pub async fn find_user_by_id<'e>(
    ex: impl PgExecutor<'e>,
    user_id: Uuid,
) -> Result<Option<User>, ServiceError> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(ex)
        .await
        .map_err(ServiceError::from)
}

pub async fn find_user_by_email<'e>(
    ex: impl PgExecutor<'e>,
    email: &str,
) -> Result<Option<User>, ServiceError> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
        .bind(email)
        .fetch_optional(ex)
        .await
        .map_err(ServiceError::from)
}

pub async fn find_user_by_username<'e>(
    ex: impl PgExecutor<'e>,
    username: &str,
) -> Result<Option<User>, ServiceError> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(ex)
        .await
        .map_err(ServiceError::from)
}

pub async fn find_user_by_phone<'e>(
    ex: impl PgExecutor<'e>,
    phone_number: &str,
) -> Result<Option<User>, ServiceError> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE phone_number = $1")
        .bind(phone_number)
        .fetch_optional(ex)
        .await
        .map_err(ServiceError::from)
}

pub async fn find_superuser<'e>(ex: impl PgExecutor<'e>) -> Result<Option<User>, ServiceError> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE is_superuser")
        .fetch_optional(ex)
        .await
        .map_err(ServiceError::from)
}

/// List users, superuser excluded, oldest first.
pub async fn list_users<'e>(
    ex: impl PgExecutor<'e>,
    skip: i64,
    limit: i64,
) -> Result<Vec<User>, ServiceError> {
    sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE NOT is_superuser ORDER BY created_at OFFSET $1 LIMIT $2",
    )
    .bind(skip)
    .bind(limit)
    .fetch_all(ex)
    .await
    .map_err(ServiceError::from)
}

pub async fn insert_user<'e>(ex: impl PgExecutor<'e>, user: &User) -> Result<(), ServiceError> {
    sqlx::query(
        r#"
        INSERT INTO users (id, username, email, phone_number, password_hash,
                           is_verified, is_superuser, status, twofa_secret,
                           created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        "#,
    )
    .bind(user.id)
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.phone_number)
    .bind(&user.password_hash)
    .bind(user.is_verified)
    .bind(user.is_superuser)
    .bind(&user.status)
    .bind(&user.twofa_secret)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(ex)
    .await?;
    Ok(())
}

pub async fn update_user<'e>(ex: impl PgExecutor<'e>, user: &User) -> Result<(), ServiceError> {
    sqlx::query(
        r#"
        UPDATE users
        SET username = $2, email = $3, phone_number = $4, password_hash = $5,
            is_verified = $6, status = $7, twofa_secret = $8, updated_at = now()
        WHERE id = $1
        "#,
    )
    .bind(user.id)
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.phone_number)
    .bind(&user.password_hash)
    .bind(user.is_verified)
    .bind(&user.status)
    .bind(&user.twofa_secret)
    .execute(ex)
    .await?;
    Ok(())
}

pub async fn delete_user<'e>(ex: impl PgExecutor<'e>, user_id: Uuid) -> Result<u64, ServiceError> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(ex)
        .await?;
    Ok(result.rows_affected())
}

// ==================== Staff Operations ====================

pub async fn find_staff_by_id<'e>(
    ex: impl PgExecutor<'e>,
    staff_id: Uuid,
) -> Result<Option<StaffProfile>, ServiceError> {
    sqlx::query_as::<_, StaffProfile>("SELECT * FROM staff_profiles WHERE id = $1")
        .bind(staff_id)
        .fetch_optional(ex)
        .await
        .map_err(ServiceError::from)
}

pub async fn find_staff_by_user_id<'e>(
    ex: impl PgExecutor<'e>,
    user_id: Uuid,
) -> Result<Option<StaffProfile>, ServiceError> {
    sqlx::query_as::<_, StaffProfile>("SELECT * FROM staff_profiles WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(ex)
        .await
        .map_err(ServiceError::from)
}

/// List staff profiles, the superuser profile excluded, oldest first.
pub async fn list_staff<'e>(
    ex: impl PgExecutor<'e>,
    skip: i64,
    limit: i64,
) -> Result<Vec<StaffProfile>, ServiceError> {
    sqlx::query_as::<_, StaffProfile>(
        "SELECT * FROM staff_profiles WHERE role <> 'superuser' ORDER BY created_at OFFSET $1 LIMIT $2",
    )
    .bind(skip)
    .bind(limit)
    .fetch_all(ex)
    .await
    .map_err(ServiceError::from)
}

pub async fn staff_exists_with_role<'e>(
    ex: impl PgExecutor<'e>,
    role: &str,
) -> Result<bool, ServiceError> {
    let exists: (bool,) =
        sqlx::query_as("SELECT EXISTS (SELECT 1 FROM staff_profiles WHERE role = $1)")
            .bind(role)
            .fetch_one(ex)
            .await?;
    Ok(exists.0)
}

pub async fn staff_exists_with_department<'e>(
    ex: impl PgExecutor<'e>,
    department: &str,
) -> Result<bool, ServiceError> {
    let exists: (bool,) =
        sqlx::query_as("SELECT EXISTS (SELECT 1 FROM staff_profiles WHERE department = $1)")
            .bind(department)
            .fetch_one(ex)
            .await?;
    Ok(exists.0)
}

pub async fn insert_staff<'e>(
    ex: impl PgExecutor<'e>,
    staff: &StaffProfile,
) -> Result<(), ServiceError> {
    sqlx::query(
        r#"
        INSERT INTO staff_profiles (id, user_id, department, role, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(staff.id)
    .bind(staff.user_id)
    .bind(&staff.department)
    .bind(&staff.role)
    .bind(staff.created_at)
    .bind(staff.updated_at)
    .execute(ex)
    .await?;
    Ok(())
}

pub async fn update_staff<'e>(
    ex: impl PgExecutor<'e>,
    staff: &StaffProfile,
) -> Result<(), ServiceError> {
    sqlx::query(
        "UPDATE staff_profiles SET department = $2, role = $3, updated_at = now() WHERE id = $1",
    )
    .bind(staff.id)
    .bind(&staff.department)
    .bind(&staff.role)
    .execute(ex)
    .await?;
    Ok(())
}

pub async fn delete_staff<'e>(
    ex: impl PgExecutor<'e>,
    staff_id: Uuid,
) -> Result<u64, ServiceError> {
    let result = sqlx::query("DELETE FROM staff_profiles WHERE id = $1")
        .bind(staff_id)
        .execute(ex)
        .await?;
    Ok(result.rows_affected())
}

// ==================== Permission Operations ====================

pub async fn find_permission_by_name<'e>(
    ex: impl PgExecutor<'e>,
    name: &str,
) -> Result<Option<Permission>, ServiceError> {
    sqlx::query_as::<_, Permission>("SELECT * FROM permissions WHERE name = $1")
        .bind(name)
        .fetch_optional(ex)
        .await
        .map_err(ServiceError::from)
}

pub async fn insert_permission<'e>(
    ex: impl PgExecutor<'e>,
    permission: &Permission,
) -> Result<(), ServiceError> {
    sqlx::query(
        "INSERT INTO permissions (id, name, created_at) VALUES ($1, $2, $3) ON CONFLICT (name) DO NOTHING",
    )
    .bind(permission.id)
    .bind(&permission.name)
    .bind(permission.created_at)
    .execute(ex)
    .await?;
    Ok(())
}

pub async fn list_permission_names_for_staff<'e>(
    ex: impl PgExecutor<'e>,
    staff_id: Uuid,
) -> Result<Vec<String>, ServiceError> {
    let rows: Vec<(String,)> = sqlx::query_as(
        r#"
        SELECT p.name FROM permissions p
        JOIN staff_permissions sp ON sp.permission_id = p.id
        WHERE sp.staff_id = $1
        ORDER BY p.name
        "#,
    )
    .bind(staff_id)
    .fetch_all(ex)
    .await?;
    Ok(rows.into_iter().map(|(name,)| name).collect())
}

pub async fn grant_permission<'e>(
    ex: impl PgExecutor<'e>,
    staff_id: Uuid,
    permission_id: Uuid,
) -> Result<(), ServiceError> {
    sqlx::query(
        "INSERT INTO staff_permissions (staff_id, permission_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(staff_id)
    .bind(permission_id)
    .execute(ex)
    .await?;
    Ok(())
}

pub async fn revoke_permission<'e>(
    ex: impl PgExecutor<'e>,
    staff_id: Uuid,
    permission_id: Uuid,
) -> Result<u64, ServiceError> {
    let result =
        sqlx::query("DELETE FROM staff_permissions WHERE staff_id = $1 AND permission_id = $2")
            .bind(staff_id)
            .bind(permission_id)
            .execute(ex)
            .await?;
    Ok(result.rows_affected())
}

// ==================== Session Operations ====================

pub async fn insert_session<'e>(
    ex: impl PgExecutor<'e>,
    session: &Session,
) -> Result<(), ServiceError> {
    sqlx::query(
        r#"
        INSERT INTO sessions (id, user_id, token_hash, is_valid, expires_at,
                              user_agent, ip_address, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(session.id)
    .bind(session.user_id)
    .bind(&session.token_hash)
    .bind(session.is_valid)
    .bind(session.expires_at)
    .bind(&session.user_agent)
    .bind(&session.ip_address)
    .bind(session.created_at)
    .bind(session.updated_at)
    .execute(ex)
    .await?;
    Ok(())
}

/// Look up the session matching token+user that still has its validity flag
/// set. Expiry is checked by the caller (lazy-expiry policy).
pub async fn find_active_session<'e>(
    ex: impl PgExecutor<'e>,
    user_id: Uuid,
    token_hash: &str,
) -> Result<Option<Session>, ServiceError> {
    sqlx::query_as::<_, Session>(
        "SELECT * FROM sessions WHERE user_id = $1 AND token_hash = $2 AND is_valid",
    )
    .bind(user_id)
    .bind(token_hash)
    .fetch_optional(ex)
    .await
    .map_err(ServiceError::from)
}

/// Flip the validity flag on the matching active session. Returns the number
/// of rows updated; zero means no such active session.
pub async fn invalidate_session<'e>(
    ex: impl PgExecutor<'e>,
    user_id: Uuid,
    token_hash: &str,
) -> Result<u64, ServiceError> {
    let result = sqlx::query(
        r#"
        UPDATE sessions SET is_valid = FALSE, updated_at = now()
        WHERE user_id = $1 AND token_hash = $2 AND is_valid
        "#,
    )
    .bind(user_id)
    .bind(token_hash)
    .execute(ex)
    .await?;
    Ok(result.rows_affected())
}

// ==================== Activity Log Operations ====================

pub async fn insert_activity_log<'e>(
    ex: impl PgExecutor<'e>,
    log: &ActivityLog,
) -> Result<(), ServiceError> {
    sqlx::query(
        r#"
        INSERT INTO activity_logs (id, user_id, activity_type, description,
                                   ip_address, user_agent, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(log.id)
    .bind(log.user_id)
    .bind(&log.activity_type)
    .bind(&log.description)
    .bind(&log.ip_address)
    .bind(&log.user_agent)
    .bind(log.created_at)
    .execute(ex)
    .await?;
    Ok(())
}

pub async fn list_activity_logs_for_user<'e>(
    ex: impl PgExecutor<'e>,
    user_id: Uuid,
    skip: i64,
    limit: i64,
) -> Result<Vec<ActivityLog>, ServiceError> {
    sqlx::query_as::<_, ActivityLog>(
        "SELECT * FROM activity_logs WHERE user_id = $1 ORDER BY created_at DESC OFFSET $2 LIMIT $3",
    )
    .bind(user_id)
    .bind(skip)
    .bind(limit)
    .fetch_all(ex)
    .await
    .map_err(ServiceError::from)
}
