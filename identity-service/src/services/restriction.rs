//! Restriction engine: what staff can do to other staff based on roles.

use sqlx::postgres::PgConnection;

use crate::models::{Department, StaffProfile, StaffRole, UpdateStaffRequest};
use crate::services::{database, ServiceError};

/// Actions governed by the restriction engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaffAction {
    View,
    Edit,
    Delete,
    Create,
}

impl StaffAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            StaffAction::View => "view",
            StaffAction::Edit => "edit",
            StaffAction::Delete => "delete",
            StaffAction::Create => "create",
        }
    }
}

pub struct RestrictionService;

impl RestrictionService {
    /// Core restriction enforcement: decides whether `actor` may perform
    /// `action` on `target`. Roles outside the superuser/admin hierarchy are
    /// governed by the permission check alone, not by this engine.
    pub fn enforce(
        actor: &StaffProfile,
        target: &StaffProfile,
        action: StaffAction,
    ) -> Result<(), ServiceError> {
        if target.has_superuser_role() {
            Self::enforce_superuser_rules(actor, target, action)
        } else if target.has_admin_role() {
            Self::enforce_admin_rules(actor, action)
        } else {
            Ok(())
        }
    }

    /// Superuser rules: only the superuser itself may act on its own record.
    /// The role/department freeze on edits is enforced separately by
    /// [`RestrictionService::ensure_superuser_fields_frozen`].
    fn enforce_superuser_rules(
        actor: &StaffProfile,
        target: &StaffProfile,
        action: StaffAction,
    ) -> Result<(), ServiceError> {
        if actor.id != target.id {
            return Err(ServiceError::Forbidden(format!(
                "You cannot {} another superuser",
                action.as_str()
            )));
        }
        Ok(())
    }

    /// Admin rules: only the superuser can view/edit/delete/create admins.
    fn enforce_admin_rules(actor: &StaffProfile, action: StaffAction) -> Result<(), ServiceError> {
        if actor.has_superuser_role() {
            return Ok(());
        }
        Err(ServiceError::Forbidden(format!(
            "Only the superuser can {} admins",
            action.as_str()
        )))
    }

    /// The superuser's role and department are frozen after creation, for
    /// everyone including the superuser itself.
    pub fn ensure_superuser_fields_frozen(
        target: &StaffProfile,
        update: &UpdateStaffRequest,
    ) -> Result<(), ServiceError> {
        if target.has_superuser_role() && (update.role.is_some() || update.department.is_some()) {
            return Err(ServiceError::Forbidden(
                "The superuser role and department cannot be edited".to_string(),
            ));
        }
        Ok(())
    }

    /// Prevent creation or promotion of a second superuser. Both reserved
    /// values are independent singletons; each check runs whenever its field
    /// is being set to the sentinel. Callers run this inside the transaction
    /// of the mutation; the partial unique indexes catch concurrent writers.
    pub async fn ensure_single_superuser(
        conn: &mut PgConnection,
        role: StaffRole,
        department: Department,
    ) -> Result<(), ServiceError> {
        if role == StaffRole::Superuser
            && database::staff_exists_with_role(&mut *conn, StaffRole::Superuser.as_str()).await?
        {
            return Err(ServiceError::Conflict(
                "A superuser already exists".to_string(),
            ));
        }

        if department == Department::Superuser
            && database::staff_exists_with_department(&mut *conn, Department::Superuser.as_str())
                .await?
        {
            return Err(ServiceError::Conflict(
                "A superuser department already exists".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn staff(role: StaffRole) -> StaffProfile {
        StaffProfile::new(Uuid::new_v4(), Department::Operations, role)
    }

    #[test]
    fn nobody_else_touches_the_superuser() {
        let superuser = staff(StaffRole::Superuser);
        for role in [
            StaffRole::Admin,
            StaffRole::Support,
            StaffRole::Compliance,
            StaffRole::Manager,
            StaffRole::General,
        ] {
            let actor = staff(role);
            for action in [
                StaffAction::View,
                StaffAction::Edit,
                StaffAction::Delete,
                StaffAction::Create,
            ] {
                let result = RestrictionService::enforce(&actor, &superuser, action);
                assert!(
                    matches!(result, Err(ServiceError::Forbidden(_))),
                    "{:?} should not {} the superuser",
                    role,
                    action.as_str()
                );
            }
        }
    }

    #[test]
    fn superuser_may_act_on_itself() {
        let superuser = staff(StaffRole::Superuser);
        for action in [StaffAction::View, StaffAction::Edit, StaffAction::Delete] {
            assert!(RestrictionService::enforce(&superuser, &superuser, action).is_ok());
        }
    }

    #[test]
    fn another_superuser_profile_is_still_foreign() {
        // Identity is by exact id match, not by holding the superuser role.
        let one = staff(StaffRole::Superuser);
        let other = staff(StaffRole::Superuser);
        let result = RestrictionService::enforce(&one, &other, StaffAction::Delete);
        assert!(matches!(result, Err(ServiceError::Forbidden(_))));
    }

    #[test]
    fn only_superuser_manages_admins() {
        let admin = staff(StaffRole::Admin);

        let superuser = staff(StaffRole::Superuser);
        assert!(RestrictionService::enforce(&superuser, &admin, StaffAction::Edit).is_ok());
        assert!(RestrictionService::enforce(&superuser, &admin, StaffAction::Delete).is_ok());

        let support = staff(StaffRole::Support);
        let result = RestrictionService::enforce(&support, &admin, StaffAction::View);
        assert!(matches!(result, Err(ServiceError::Forbidden(_))));

        let other_admin = staff(StaffRole::Admin);
        let result = RestrictionService::enforce(&other_admin, &admin, StaffAction::Edit);
        assert!(matches!(result, Err(ServiceError::Forbidden(_))));
    }

    #[test]
    fn ordinary_roles_are_not_restricted_here() {
        let support = staff(StaffRole::Support);
        let general = staff(StaffRole::General);
        for action in [
            StaffAction::View,
            StaffAction::Edit,
            StaffAction::Delete,
            StaffAction::Create,
        ] {
            assert!(RestrictionService::enforce(&support, &general, action).is_ok());
        }
    }

    #[test]
    fn superuser_role_and_department_are_frozen() {
        let superuser = staff(StaffRole::Superuser);

        let update = UpdateStaffRequest {
            role: Some(StaffRole::Admin),
            department: None,
        };
        assert!(matches!(
            RestrictionService::ensure_superuser_fields_frozen(&superuser, &update),
            Err(ServiceError::Forbidden(_))
        ));

        let update = UpdateStaffRequest {
            role: None,
            department: Some(Department::Engineering),
        };
        assert!(matches!(
            RestrictionService::ensure_superuser_fields_frozen(&superuser, &update),
            Err(ServiceError::Forbidden(_))
        ));

        let update = UpdateStaffRequest::default();
        assert!(RestrictionService::ensure_superuser_fields_frozen(&superuser, &update).is_ok());

        // Ordinary staff are not frozen.
        let support = staff(StaffRole::Support);
        let update = UpdateStaffRequest {
            role: Some(StaffRole::Manager),
            department: Some(Department::Support),
        };
        assert!(RestrictionService::ensure_superuser_fields_frozen(&support, &update).is_ok());
    }
}
