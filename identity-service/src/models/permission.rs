//! Permission model - the closed capability vocabulary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// The closed permission vocabulary, seeded at startup. Names are matched
/// exactly and case-sensitively.
pub const PERMISSION_VOCABULARY: &[&str] = &[
    "user:create",
    "user:read",
    "user:update",
    "user:delete",
    "user:list",
    "staff:create",
    "staff:read",
    "staff:update",
    "staff:delete",
    "staff:list",
    "permission:assign",
    "permission:revoke",
];

/// Permission entity.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Permission {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Permission {
    pub fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            created_at: Utc::now(),
        }
    }
}
