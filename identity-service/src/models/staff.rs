//! Staff profile model - the authorization attachment to a user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Staff role codes. `superuser` is reserved: at most one profile may hold it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    Superuser,
    Admin,
    Support,
    Compliance,
    Manager,
    General,
}

impl StaffRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            StaffRole::Superuser => "superuser",
            StaffRole::Admin => "admin",
            StaffRole::Support => "support",
            StaffRole::Compliance => "compliance",
            StaffRole::Manager => "manager",
            StaffRole::General => "general",
        }
    }
}

/// Department codes. `superuser` is reserved the same way the role is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Department {
    Superuser,
    Engineering,
    Operations,
    Support,
    Compliance,
}

impl Department {
    pub fn as_str(&self) -> &'static str {
        match self {
            Department::Superuser => "superuser",
            Department::Engineering => "engineering",
            Department::Operations => "operations",
            Department::Support => "support",
            Department::Compliance => "compliance",
        }
    }
}

/// Staff profile entity.
#[derive(Debug, Clone, FromRow)]
pub struct StaffProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub department: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StaffProfile {
    /// Create a new staff profile.
    pub fn new(user_id: Uuid, department: Department, role: StaffRole) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            department: department.as_str().to_string(),
            role: role.as_str().to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_superuser_role(&self) -> bool {
        self.role == StaffRole::Superuser.as_str()
    }

    pub fn has_superuser_department(&self) -> bool {
        self.department == Department::Superuser.as_str()
    }

    pub fn has_admin_role(&self) -> bool {
        self.role == StaffRole::Admin.as_str()
    }
}

/// Request to create a staff profile.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateStaffRequest {
    pub user_id: Uuid,
    pub department: Department,
    pub role: StaffRole,
}

/// Request to update a staff profile's role/department.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateStaffRequest {
    pub department: Option<Department>,
    pub role: Option<StaffRole>,
}

/// Staff profile response for API.
#[derive(Debug, Serialize, ToSchema)]
pub struct StaffResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub department: String,
    pub role: String,
    pub permissions: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl StaffResponse {
    pub fn from_profile(profile: StaffProfile, permissions: Vec<String>) -> Self {
        Self {
            id: profile.id,
            user_id: profile.user_id,
            department: profile.department,
            role: profile.role,
            permissions,
            created_at: profile.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_codes_are_detected() {
        let staff = StaffProfile::new(Uuid::new_v4(), Department::Superuser, StaffRole::Superuser);
        assert!(staff.has_superuser_role());
        assert!(staff.has_superuser_department());
        assert!(!staff.has_admin_role());

        let admin = StaffProfile::new(Uuid::new_v4(), Department::Operations, StaffRole::Admin);
        assert!(admin.has_admin_role());
        assert!(!admin.has_superuser_role());
        assert!(!admin.has_superuser_department());
    }
}
