//! Activity log model - append-only audit records.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::Serialize;
use sqlx::FromRow;
use std::collections::HashMap;
use utoipa::ToSchema;
use uuid::Uuid;

/// Human-readable description templates, keyed by activity type. Unknown
/// types fall back to the raw type string.
static ACTIVITY_DESCRIPTIONS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("login", "User {username} logged in successfully."),
        ("login_failed", "Failed login attempt for {email}."),
        (
            "login_blocked",
            "Login blocked for {username}: account suspended.",
        ),
        ("logout", "User {username} logged out."),
        ("logout_failed", "Failed logout attempt by {username}."),
        ("token_refresh", "User {username} refreshed an access token."),
        ("user:create", "User {target} created by {username}."),
        (
            "user:create_denied",
            "User creation denied for {username}: {reason}.",
        ),
        ("user:read", "User {target} retrieved by {username}."),
        (
            "user:read_denied",
            "User {target} may not be viewed by {username}.",
        ),
        ("user:update", "User {target} updated by {username}."),
        (
            "user:update_denied",
            "User {target} may not be updated by {username}.",
        ),
        ("user:delete", "User {target} deleted by {username}."),
        (
            "user:delete_denied",
            "User {target} may not be deleted by {username}.",
        ),
        ("user:list", "{count} users retrieved by {username}."),
        ("staff:promote", "Admin {admin} promoted user {user} to staff."),
        (
            "staff:demote",
            "Admin {admin} removed staff role from user {user}.",
        ),
        ("staff:read", "Staff profile of {user} retrieved by {admin}."),
        ("staff:update", "Staff profile of {user} updated by {admin}."),
        ("staff:list", "{count} staff profiles retrieved by {username}."),
        (
            "permission:assign",
            "Permission '{permission}' granted to user {user}.",
        ),
        (
            "permission:revoke",
            "Permission '{permission}' revoked from user {user}.",
        ),
        (
            "permission_denied",
            "Permission '{permission}' denied for {username}.",
        ),
        ("activity:read", "Activity log of {target} viewed by {username}."),
        ("user:create_error", "Error creating user: {error}"),
        ("user:read_error", "Error retrieving user: {error}"),
        ("user:list_error", "Error listing users: {error}"),
        ("user:update_error", "Error updating user: {error}"),
        ("user:delete_error", "Error deleting user: {error}"),
    ])
});

/// Render the description for an activity type. `{placeholder}` tokens are
/// substituted from `fields`; placeholders with no matching field render as
/// empty rather than failing.
pub fn describe_activity(activity_type: &str, fields: &HashMap<&str, String>) -> String {
    let template = ACTIVITY_DESCRIPTIONS
        .get(activity_type)
        .copied()
        .unwrap_or(activity_type);
    render_template(template, fields)
}

fn render_template(template: &str, fields: &HashMap<&str, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        match rest[start + 1..].find('}') {
            Some(end) => {
                let key = &rest[start + 1..start + 1 + end];
                if let Some(value) = fields.get(key) {
                    out.push_str(value);
                }
                rest = &rest[start + end + 2..];
            }
            None => {
                // Unterminated placeholder, keep it verbatim.
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}

/// Activity log entity. Rows are written once and never mutated or deleted.
#[derive(Debug, Clone, FromRow)]
pub struct ActivityLog {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub activity_type: String,
    pub description: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ActivityLog {
    pub fn new(
        user_id: Option<Uuid>,
        activity_type: String,
        description: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            activity_type,
            description,
            ip_address,
            user_agent,
            created_at: Utc::now(),
        }
    }
}

/// Activity log response for API.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActivityLogResponse {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub activity_type: String,
    pub description: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ActivityLog> for ActivityLogResponse {
    fn from(log: ActivityLog) -> Self {
        Self {
            id: log.id,
            user_id: log.user_id,
            activity_type: log.activity_type,
            description: log.description,
            ip_address: log.ip_address,
            user_agent: log.user_agent,
            created_at: log.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&'static str, &str)]) -> HashMap<&'static str, String> {
        pairs.iter().map(|(k, v)| (*k, v.to_string())).collect()
    }

    #[test]
    fn known_type_renders_template() {
        let description = describe_activity("login", &fields(&[("username", "alice")]));
        assert_eq!(description, "User alice logged in successfully.");
    }

    #[test]
    fn unknown_type_falls_back_to_raw_type() {
        let description = describe_activity("kyc:approve", &fields(&[]));
        assert_eq!(description, "kyc:approve");
    }

    #[test]
    fn missing_fields_render_empty_instead_of_failing() {
        let description = describe_activity("login", &fields(&[]));
        assert_eq!(description, "User  logged in successfully.");
    }

    #[test]
    fn extra_fields_are_ignored() {
        let description = describe_activity(
            "logout",
            &fields(&[("username", "bob"), ("unrelated", "x")]),
        );
        assert_eq!(description, "User bob logged out.");
    }

    #[test]
    fn unterminated_brace_is_left_verbatim() {
        let rendered = render_template("dangling {brace", &fields(&[("brace", "x")]));
        assert_eq!(rendered, "dangling {brace");
    }

    #[test]
    fn multiple_placeholders_fill_in_order() {
        let description = describe_activity(
            "permission:assign",
            &fields(&[("permission", "user:read"), ("user", "carol")]),
        );
        assert_eq!(description, "Permission 'user:read' granted to user carol.");
    }
}
