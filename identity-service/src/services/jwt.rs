use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::services::ServiceError;

/// JWT service for token generation and validation. Stateless: no store
/// lookups, revocation lives at the session layer.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    access_token_expire_minutes: i64,
    refresh_token_expire_days: i64,
}

/// Claims carried by both access and refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Token ID; keeps two tokens minted in the same second distinct
    pub jti: String,
}

impl JwtService {
    /// Create a new JWT service from the shared signing secret.
    pub fn new(config: &JwtConfig) -> Result<Self, anyhow::Error> {
        let algorithm = Algorithm::from_str(&config.algorithm)
            .map_err(|e| anyhow::anyhow!("Invalid JWT algorithm '{}': {}", config.algorithm, e))?;

        // The key is a shared secret, so only HMAC family algorithms apply.
        if !matches!(
            algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(anyhow::anyhow!(
                "JWT algorithm '{}' is not an HMAC algorithm",
                config.algorithm
            ));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret_key.as_bytes()),
            algorithm,
            access_token_expire_minutes: config.access_token_expire_minutes,
            refresh_token_expire_days: config.refresh_token_expire_days,
        })
    }

    /// Generate a short-lived access token for a user.
    pub fn issue_access_token(&self, user_id: Uuid) -> Result<String, ServiceError> {
        self.issue(user_id, Duration::minutes(self.access_token_expire_minutes))
    }

    /// Generate a long-lived refresh token for a user.
    pub fn issue_refresh_token(&self, user_id: Uuid) -> Result<String, ServiceError> {
        self.issue(user_id, Duration::days(self.refresh_token_expire_days))
    }

    fn issue(&self, user_id: Uuid, ttl: Duration) -> Result<String, ServiceError> {
        let now = Utc::now();
        let claims = TokenClaims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let header = Header::new(self.algorithm);
        encode(&header, &claims, &self.encoding_key)
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Failed to encode token: {}", e)))
    }

    /// Validate and decode a token.
    pub fn decode(&self, token: &str) -> Result<TokenClaims, ServiceError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;

        let token_data =
            decode::<TokenClaims>(token, &self.decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => ServiceError::TokenExpired,
                    _ => ServiceError::TokenInvalid,
                }
            })?;

        Ok(token_data.claims)
    }

    /// Get access token expiry in seconds (for client info).
    pub fn access_token_expiry_seconds(&self) -> i64 {
        self.access_token_expire_minutes * 60
    }

    /// Get refresh token expiry in days (for session rows).
    pub fn refresh_token_expiry_days(&self) -> i64 {
        self.refresh_token_expire_days
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(secret: &str) -> JwtConfig {
        JwtConfig {
            secret_key: secret.to_string(),
            algorithm: "HS256".to_string(),
            access_token_expire_minutes: 15,
            refresh_token_expire_days: 7,
        }
    }

    #[test]
    fn access_token_round_trip() {
        let service = JwtService::new(&test_config("test-secret")).unwrap();
        let user_id = Uuid::new_v4();

        let token = service.issue_access_token(user_id).unwrap();
        let claims = service.decode(&token).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert!(claims.exp > claims.iat);
        assert_eq!(claims.exp - claims.iat, 15 * 60);
    }

    #[test]
    fn refresh_token_round_trip() {
        let service = JwtService::new(&test_config("test-secret")).unwrap();
        let user_id = Uuid::new_v4();

        let token = service.issue_refresh_token(user_id).unwrap();
        let claims = service.decode(&token).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
    }

    #[test]
    fn expired_token_is_rejected_distinctly() {
        let service = JwtService::new(&test_config("test-secret")).unwrap();
        let token = service
            .issue(Uuid::new_v4(), Duration::minutes(-5))
            .unwrap();

        match service.decode(&token) {
            Err(ServiceError::TokenExpired) => {}
            other => panic!("expected TokenExpired, got {:?}", other.map(|c| c.sub)),
        }
    }

    #[test]
    fn token_signed_with_other_secret_is_invalid() {
        let issuer = JwtService::new(&test_config("secret-a")).unwrap();
        let verifier = JwtService::new(&test_config("secret-b")).unwrap();

        let token = issuer.issue_access_token(Uuid::new_v4()).unwrap();
        match verifier.decode(&token) {
            Err(ServiceError::TokenInvalid) => {}
            other => panic!("expected TokenInvalid, got {:?}", other.map(|c| c.sub)),
        }
    }

    #[test]
    fn garbage_token_is_invalid() {
        let service = JwtService::new(&test_config("test-secret")).unwrap();
        match service.decode("not-a-jwt") {
            Err(ServiceError::TokenInvalid) => {}
            other => panic!("expected TokenInvalid, got {:?}", other.map(|c| c.sub)),
        }
    }

    #[test]
    fn non_hmac_algorithm_is_rejected_at_construction() {
        let mut config = test_config("test-secret");
        config.algorithm = "RS256".to_string();
        assert!(JwtService::new(&config).is_err());

        config.algorithm = "bogus".to_string();
        assert!(JwtService::new(&config).is_err());
    }
}
