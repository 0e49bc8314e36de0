//! Activity audit pipeline. Every privileged operation, denial, and error
//! records an entry here.

use sqlx::postgres::PgConnection;
use std::collections::HashMap;
use uuid::Uuid;

use crate::middleware::RequestMeta;
use crate::models::{describe_activity, ActivityLog, ActivityLogResponse, User};
use crate::services::{database, Database, RestrictionService, ServiceError, StaffAction};

pub struct ActivityLogger;

impl ActivityLogger {
    /// Record an activity entry on the given connection. Mutating operations
    /// pass their open transaction so the audit row commits or rolls back
    /// with the mutation; a failed write surfaces as a persistence error and
    /// must abort the unit of work.
    ///
    /// When both an actor and a distinct target are supplied, the restriction
    /// engine's view check runs between their staff profiles first; a
    /// restriction failure aborts the write and propagates.
    pub async fn record(
        conn: &mut PgConnection,
        actor: Option<&User>,
        target: Option<&User>,
        activity_type: &str,
        meta: &RequestMeta,
        extra_fields: &[(&str, &str)],
    ) -> Result<ActivityLog, ServiceError> {
        if let (Some(actor), Some(target)) = (actor, target) {
            if actor.id != target.id {
                let actor_staff = database::find_staff_by_user_id(&mut *conn, actor.id).await?;
                let target_staff = database::find_staff_by_user_id(&mut *conn, target.id).await?;
                if let (Some(actor_staff), Some(target_staff)) = (actor_staff, target_staff) {
                    RestrictionService::enforce(&actor_staff, &target_staff, StaffAction::View)?;
                }
            }
        }

        let mut fields: HashMap<&str, String> = HashMap::new();
        if let Some(actor) = actor {
            fields.insert("username", actor.username.clone());
        }
        if let Some(target) = target {
            fields.insert("target", target.username.clone());
        }
        for &(key, value) in extra_fields {
            fields.insert(key, value.to_string());
        }

        let description = describe_activity(activity_type, &fields);

        let log = ActivityLog::new(
            actor.map(|u| u.id),
            activity_type.to_string(),
            description,
            meta.ip_address.clone(),
            meta.user_agent.clone(),
        );

        database::insert_activity_log(&mut *conn, &log).await?;

        tracing::debug!(
            activity_type = %log.activity_type,
            actor = ?log.user_id,
            "Activity recorded"
        );

        Ok(log)
    }
}

/// Read side of the audit trail.
#[derive(Clone)]
pub struct ActivityService {
    db: Database,
}

impl ActivityService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// List activity entries. An actor may always read their own entries;
    /// reading another user's entries requires a staff profile and passes
    /// the restriction engine's view check against the target's profile.
    pub async fn list_for(
        &self,
        actor: &User,
        target_user_id: Option<Uuid>,
        skip: i64,
        limit: i64,
        meta: &RequestMeta,
    ) -> Result<Vec<ActivityLogResponse>, ServiceError> {
        let target_id = target_user_id.unwrap_or(actor.id);

        if target_id != actor.id {
            let target = database::find_user_by_id(self.db.pool(), target_id)
                .await?
                .ok_or_else(|| ServiceError::NotFound("User".to_string()))?;

            let actor_staff = database::find_staff_by_user_id(self.db.pool(), actor.id)
                .await?
                .ok_or_else(|| {
                    ServiceError::Forbidden("User is not a staff member".to_string())
                })?;

            if let Some(target_staff) =
                database::find_staff_by_user_id(self.db.pool(), target_id).await?
            {
                RestrictionService::enforce(&actor_staff, &target_staff, StaffAction::View)?;
            }

            let mut conn = self.db.pool().acquire().await.map_err(ServiceError::from)?;
            ActivityLogger::record(
                &mut conn,
                Some(actor),
                Some(&target),
                "activity:read",
                meta,
                &[],
            )
            .await?;
        }

        let logs =
            database::list_activity_logs_for_user(self.db.pool(), target_id, skip, limit).await?;

        Ok(logs.into_iter().map(ActivityLogResponse::from).collect())
    }
}
