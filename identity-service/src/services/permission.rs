//! Permission gate wrapping every privileged operation.

use crate::middleware::RequestMeta;
use crate::models::{StaffProfile, User};
use crate::services::{database, ActivityLogger, Database, ServiceError};

/// Check that `actor` is staff and holds `permission` (exact, case-sensitive
/// name match). Denials are audited before the error is returned. Returns
/// the actor's staff profile for downstream restriction checks.
pub async fn require_permission(
    db: &Database,
    actor: &User,
    permission: &str,
    meta: &RequestMeta,
) -> Result<StaffProfile, ServiceError> {
    let mut conn = db.pool().acquire().await.map_err(ServiceError::from)?;

    let staff = match database::find_staff_by_user_id(&mut *conn, actor.id).await? {
        Some(staff) => staff,
        None => {
            ActivityLogger::record(
                &mut conn,
                Some(actor),
                None,
                "permission_denied",
                meta,
                &[("permission", permission)],
            )
            .await?;
            return Err(ServiceError::Forbidden(
                "User is not a staff member".to_string(),
            ));
        }
    };

    let granted = database::list_permission_names_for_staff(&mut *conn, staff.id).await?;
    if !granted.iter().any(|name| name == permission) {
        ActivityLogger::record(
            &mut conn,
            Some(actor),
            None,
            "permission_denied",
            meta,
            &[("permission", permission)],
        )
        .await?;
        return Err(ServiceError::Forbidden(format!(
            "Permission denied: {}",
            permission
        )));
    }

    Ok(staff)
}
