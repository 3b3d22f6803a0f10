//! HS256 access tokens.

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use skydrive_core::AppError;
use uuid::Uuid;

/// Claims carried by an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// User id
    pub sub: Uuid,
    /// Session id; the token is only honored while this session row exists
    pub sid: Uuid,
    pub iat: i64,
    pub exp: i64,
}

/// Signing and verification keys derived from `JWT_SECRET`
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn issue(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let claims = AccessClaims {
            sub: user_id,
            sid: session_id,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to sign access token: {}", e)))
    }

    /// Check signature and expiry.
    pub fn verify(&self, token: &str) -> Result<AccessClaims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        let token_data = decode::<AccessClaims>(token, &self.decoding, &validation).map_err(|e| {
            tracing::debug!("JWT validation failed: {}", e);
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::Unauthorized("Token has expired".to_string())
                }
                _ => AppError::Unauthorized("Invalid token".to_string()),
            }
        })?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn test_issue_and_verify() {
        let keys = JwtKeys::new(SECRET);
        let (user_id, session_id) = (Uuid::new_v4(), Uuid::new_v4());
        let now = Utc::now();
        let token = keys
            .issue(user_id, session_id, now, now + Duration::hours(1))
            .unwrap();

        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.sid, session_id);
        assert_eq!(claims.iat, now.timestamp());
    }

    #[test]
    fn test_expired_token_rejected() {
        let keys = JwtKeys::new(SECRET);
        let past = Utc::now() - Duration::hours(2);
        let token = keys
            .issue(Uuid::new_v4(), Uuid::new_v4(), past, past + Duration::hours(1))
            .unwrap();

        let err = keys.verify(&token).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(ref msg) if msg.contains("expired")));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let now = Utc::now();
        let token = JwtKeys::new(SECRET)
            .issue(Uuid::new_v4(), Uuid::new_v4(), now, now + Duration::hours(1))
            .unwrap();

        let other = JwtKeys::new("ffffffffffffffffffffffffffffffff");
        assert!(other.verify(&token).is_err());
        assert!(other.verify("not.a.token").is_err());
    }
}
