//! Session model - server-side refresh token grants.

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use sqlx::FromRow;
use uuid::Uuid;

/// Session entity. One row per issued refresh token; rows are invalidated
/// on logout, never deleted.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub is_valid: bool,
    pub expires_at: DateTime<Utc>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Create a new session for a freshly issued refresh token.
    pub fn new(
        user_id: Uuid,
        refresh_token: &str,
        expiry_days: i64,
        user_agent: Option<String>,
        ip_address: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            token_hash: Self::hash_token(refresh_token),
            is_valid: true,
            expires_at: now + Duration::days(expiry_days),
            user_agent,
            ip_address,
            created_at: now,
            updated_at: now,
        }
    }

    /// SHA-256 digest of the refresh token; only the digest is stored.
    pub fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }

    /// Usable means the validity flag is set and the expiry has not passed.
    pub fn is_usable(&self) -> bool {
        self.is_valid && !self.is_expired()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_usable() {
        let session = Session::new(Uuid::new_v4(), "token", 7, None, None);
        assert!(session.is_valid);
        assert!(!session.is_expired());
        assert!(session.is_usable());
    }

    #[test]
    fn expired_session_is_not_usable_even_when_valid() {
        let mut session = Session::new(Uuid::new_v4(), "token", 7, None, None);
        session.expires_at = Utc::now() - Duration::minutes(1);
        assert!(session.is_valid);
        assert!(session.is_expired());
        assert!(!session.is_usable());
    }

    #[test]
    fn token_hash_is_stable_and_hides_the_token() {
        let a = Session::hash_token("refresh-token");
        let b = Session::hash_token("refresh-token");
        let c = Session::hash_token("other-token");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
        assert!(!a.contains("refresh"));
    }
}
