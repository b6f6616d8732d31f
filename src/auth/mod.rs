pub mod password;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::SecurityConfig;

pub use password::{hash_password, verify_password, PasswordError};

/// Longest token lifetime accepted from configuration (ten years)
pub const MAX_EXPIRY_HOURS: u64 = 24 * 365 * 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: Uuid,
    pub email: String,
    /// Session key; must match the one stored on the user
    pub sid: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, email: String, session: String, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let hours = expiry_hours.min(MAX_EXPIRY_HOURS) as i64;
        let exp = (now + Duration::hours(hours)).timestamp();

        Self {
            sub: user_id,
            email,
            sid: session,
            exp,
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
    #[error("Invalid JWT secret")]
    InvalidSecret,
    #[error("JWT expiry out of range: {0} hours")]
    InvalidExpiry(u64),
    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),
}

/// Issues and verifies HS256 bearer tokens with the configured secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_hours: u64,
}

impl TokenIssuer {
    pub fn new(secret: &str, expiry_hours: u64) -> Result<Self, JwtError> {
        if secret.is_empty() {
            return Err(JwtError::InvalidSecret);
        }
        if expiry_hours == 0 || expiry_hours > MAX_EXPIRY_HOURS {
            return Err(JwtError::InvalidExpiry(expiry_hours));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry_hours,
        })
    }

    pub fn from_config(security: &SecurityConfig) -> Result<Self, JwtError> {
        Self::new(&security.jwt_secret, security.jwt_expiry_hours)
    }

    pub fn issue(&self, user_id: Uuid, email: &str, session: &str) -> Result<String, JwtError> {
        let claims = Claims::new(user_id, email.to_string(), session.to_string(), self.expiry_hours);
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| JwtError::TokenGeneration(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| JwtError::InvalidToken(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_tokens_verify() {
        let issuer = TokenIssuer::new("secret", 1).unwrap();
        let user = Uuid::new_v4();

        let token = issuer.issue(user, "a@b.c", "session-1").unwrap();
        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.sub, user);
        assert_eq!(claims.email, "a@b.c");
        assert_eq!(claims.sid, "session-1");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn tokens_from_another_secret_are_rejected() {
        let ours = TokenIssuer::new("secret", 1).unwrap();
        let theirs = TokenIssuer::new("other", 1).unwrap();
        let token = theirs.issue(Uuid::new_v4(), "a@b.c", "s").unwrap();

        assert!(matches!(ours.verify(&token), Err(JwtError::InvalidToken(_))));
        assert!(matches!(ours.verify("garbage"), Err(JwtError::InvalidToken(_))));
    }

    #[test]
    fn empty_secret_is_refused() {
        assert!(matches!(TokenIssuer::new("", 1), Err(JwtError::InvalidSecret)));
    }

    #[test]
    fn out_of_range_expiry_is_refused() {
        for hours in [0, MAX_EXPIRY_HOURS + 1, 3_000_000_000_000, u64::MAX] {
            assert!(matches!(
                TokenIssuer::new("secret", hours),
                Err(JwtError::InvalidExpiry(h)) if h == hours
            ));
        }
        assert!(TokenIssuer::new("secret", MAX_EXPIRY_HOURS).is_ok());
    }

    #[test]
    fn claims_clamp_huge_lifetimes_instead_of_wrapping() {
        let claims = Claims::new(Uuid::new_v4(), "a@b.c".into(), "s".into(), u64::MAX);
        assert!(claims.exp > claims.iat);
        assert_eq!(claims.exp - claims.iat, MAX_EXPIRY_HOURS as i64 * 3600);
    }
}
