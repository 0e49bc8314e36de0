//! Staff service: profile CRUD and permission grants, all behind the
//! restriction engine and the permission gate.

use crate::middleware::RequestMeta;
use crate::models::{
    CreateStaffRequest, Department, StaffProfile, StaffResponse, StaffRole, UpdateStaffRequest,
    User,
};
use crate::services::{
    database, permission::require_permission, ActivityLogger, Database, RestrictionService,
    ServiceError, StaffAction,
};
use uuid::Uuid;

#[derive(Clone)]
pub struct StaffService {
    db: Database,
}

impl StaffService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn create_staff(
        &self,
        actor: &User,
        req: CreateStaffRequest,
        meta: &RequestMeta,
    ) -> Result<StaffResponse, ServiceError> {
        let actor_staff = require_permission(&self.db, actor, "staff:create", meta).await?;

        let target_user = database::find_user_by_id(self.db.pool(), req.user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User".to_string()))?;

        if database::find_staff_by_user_id(self.db.pool(), req.user_id)
            .await?
            .is_some()
        {
            return Err(ServiceError::Conflict(
                "User is already a staff member".to_string(),
            ));
        }

        let staff = StaffProfile::new(req.user_id, req.department, req.role);

        let mut tx = self.db.pool().begin().await.map_err(ServiceError::from)?;

        // Singleton check first: a second superuser is a Conflict regardless
        // of who asks. The role hierarchy is enforced after.
        RestrictionService::ensure_single_superuser(&mut tx, req.role, req.department).await?;
        RestrictionService::enforce(&actor_staff, &staff, StaffAction::Create)?;

        database::insert_staff(&mut *tx, &staff).await?;

        ActivityLogger::record(
            &mut tx,
            Some(actor),
            Some(&target_user),
            "staff:promote",
            meta,
            &[("admin", &actor.username), ("user", &target_user.username)],
        )
        .await?;

        tx.commit().await.map_err(ServiceError::from)?;

        tracing::info!(staff_id = %staff.id, user_id = %staff.user_id, "Staff profile created");
        Ok(StaffResponse::from_profile(staff, Vec::new()))
    }

    pub async fn get_staff(
        &self,
        actor: &User,
        staff_id: Uuid,
        meta: &RequestMeta,
    ) -> Result<StaffResponse, ServiceError> {
        let actor_staff = require_permission(&self.db, actor, "staff:read", meta).await?;

        let staff = database::find_staff_by_id(self.db.pool(), staff_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Staff".to_string()))?;

        RestrictionService::enforce(&actor_staff, &staff, StaffAction::View)?;

        let target_user = database::find_user_by_id(self.db.pool(), staff.user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User".to_string()))?;
        let permissions =
            database::list_permission_names_for_staff(self.db.pool(), staff.id).await?;

        let mut conn = self.db.pool().acquire().await.map_err(ServiceError::from)?;
        ActivityLogger::record(
            &mut conn,
            Some(actor),
            Some(&target_user),
            "staff:read",
            meta,
            &[("admin", &actor.username), ("user", &target_user.username)],
        )
        .await?;

        Ok(StaffResponse::from_profile(staff, permissions))
    }

    pub async fn list_staff(
        &self,
        actor: &User,
        skip: i64,
        limit: i64,
        meta: &RequestMeta,
    ) -> Result<Vec<StaffResponse>, ServiceError> {
        require_permission(&self.db, actor, "staff:list", meta).await?;

        let profiles = database::list_staff(self.db.pool(), skip, limit).await?;

        let mut responses = Vec::with_capacity(profiles.len());
        for profile in profiles {
            let permissions =
                database::list_permission_names_for_staff(self.db.pool(), profile.id).await?;
            responses.push(StaffResponse::from_profile(profile, permissions));
        }

        let mut conn = self.db.pool().acquire().await.map_err(ServiceError::from)?;
        let count = responses.len().to_string();
        ActivityLogger::record(
            &mut conn,
            Some(actor),
            None,
            "staff:list",
            meta,
            &[("count", &count)],
        )
        .await?;

        Ok(responses)
    }

    pub async fn update_staff(
        &self,
        actor: &User,
        staff_id: Uuid,
        req: UpdateStaffRequest,
        meta: &RequestMeta,
    ) -> Result<StaffResponse, ServiceError> {
        let actor_staff = require_permission(&self.db, actor, "staff:update", meta).await?;

        let mut staff = database::find_staff_by_id(self.db.pool(), staff_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Staff".to_string()))?;

        RestrictionService::enforce(&actor_staff, &staff, StaffAction::Edit)?;
        RestrictionService::ensure_superuser_fields_frozen(&staff, &req)?;

        let target_user = database::find_user_by_id(self.db.pool(), staff.user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User".to_string()))?;

        let mut tx = self.db.pool().begin().await.map_err(ServiceError::from)?;

        // Promotion to either reserved value re-runs the singleton checks.
        if req.role == Some(StaffRole::Superuser) || req.department == Some(Department::Superuser) {
            RestrictionService::ensure_single_superuser(
                &mut tx,
                req.role.unwrap_or(StaffRole::General),
                req.department.unwrap_or(Department::Operations),
            )
            .await?;
        }

        if let Some(department) = req.department {
            staff.department = department.as_str().to_string();
        }
        if let Some(role) = req.role {
            staff.role = role.as_str().to_string();
        }

        database::update_staff(&mut *tx, &staff).await?;

        ActivityLogger::record(
            &mut tx,
            Some(actor),
            Some(&target_user),
            "staff:update",
            meta,
            &[("admin", &actor.username), ("user", &target_user.username)],
        )
        .await?;

        tx.commit().await.map_err(ServiceError::from)?;

        let permissions =
            database::list_permission_names_for_staff(self.db.pool(), staff.id).await?;
        tracing::info!(staff_id = %staff.id, "Staff profile updated");
        Ok(StaffResponse::from_profile(staff, permissions))
    }

    pub async fn delete_staff(
        &self,
        actor: &User,
        staff_id: Uuid,
        meta: &RequestMeta,
    ) -> Result<(), ServiceError> {
        let actor_staff = require_permission(&self.db, actor, "staff:delete", meta).await?;

        let staff = database::find_staff_by_id(self.db.pool(), staff_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Staff".to_string()))?;

        RestrictionService::enforce(&actor_staff, &staff, StaffAction::Delete)?;

        let target_user = database::find_user_by_id(self.db.pool(), staff.user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User".to_string()))?;

        let mut tx = self.db.pool().begin().await.map_err(ServiceError::from)?;

        database::delete_staff(&mut *tx, staff.id).await?;

        ActivityLogger::record(
            &mut tx,
            Some(actor),
            None,
            "staff:demote",
            meta,
            &[("admin", &actor.username), ("user", &target_user.username)],
        )
        .await?;

        tx.commit().await.map_err(ServiceError::from)?;

        tracing::info!(staff_id = %staff.id, "Staff profile deleted");
        Ok(())
    }

    pub async fn assign_permission(
        &self,
        actor: &User,
        staff_id: Uuid,
        permission_name: &str,
        meta: &RequestMeta,
    ) -> Result<StaffResponse, ServiceError> {
        let actor_staff = require_permission(&self.db, actor, "permission:assign", meta).await?;

        let staff = database::find_staff_by_id(self.db.pool(), staff_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Staff".to_string()))?;

        RestrictionService::enforce(&actor_staff, &staff, StaffAction::Edit)?;

        let permission = database::find_permission_by_name(self.db.pool(), permission_name)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Permission".to_string()))?;

        let target_user = database::find_user_by_id(self.db.pool(), staff.user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User".to_string()))?;

        let mut tx = self.db.pool().begin().await.map_err(ServiceError::from)?;

        database::grant_permission(&mut *tx, staff.id, permission.id).await?;

        ActivityLogger::record(
            &mut tx,
            Some(actor),
            Some(&target_user),
            "permission:assign",
            meta,
            &[
                ("permission", permission_name),
                ("user", &target_user.username),
            ],
        )
        .await?;

        tx.commit().await.map_err(ServiceError::from)?;

        let permissions =
            database::list_permission_names_for_staff(self.db.pool(), staff.id).await?;
        Ok(StaffResponse::from_profile(staff, permissions))
    }

    pub async fn revoke_permission(
        &self,
        actor: &User,
        staff_id: Uuid,
        permission_name: &str,
        meta: &RequestMeta,
    ) -> Result<StaffResponse, ServiceError> {
        let actor_staff = require_permission(&self.db, actor, "permission:revoke", meta).await?;

        let staff = database::find_staff_by_id(self.db.pool(), staff_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Staff".to_string()))?;

        RestrictionService::enforce(&actor_staff, &staff, StaffAction::Edit)?;

        let permission = database::find_permission_by_name(self.db.pool(), permission_name)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Permission".to_string()))?;

        let target_user = database::find_user_by_id(self.db.pool(), staff.user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User".to_string()))?;

        let mut tx = self.db.pool().begin().await.map_err(ServiceError::from)?;

        let revoked = database::revoke_permission(&mut *tx, staff.id, permission.id).await?;
        if revoked == 0 {
            tx.rollback().await.map_err(ServiceError::from)?;
            return Err(ServiceError::NotFound("Permission grant".to_string()));
        }

        ActivityLogger::record(
            &mut tx,
            Some(actor),
            Some(&target_user),
            "permission:revoke",
            meta,
            &[
                ("permission", permission_name),
                ("user", &target_user.username),
            ],
        )
        .await?;

        tx.commit().await.map_err(ServiceError::from)?;

        let permissions =
            database::list_permission_names_for_staff(self.db.pool(), staff.id).await?;
        Ok(StaffResponse::from_profile(staff, permissions))
    }
}
