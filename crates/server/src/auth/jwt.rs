//! JWT issuance and validation for the API front door.
//!
//! Two credential flows feed this module: client-credentials (a `Client`
//! authenticating with its bcrypt-hashed secret) and authorization-code (a
//! `User` exchanging a one-time `AuthCode`). Both end up with the same
//! claims shape — a subject and a scope set — so downstream handlers never
//! need to know which flow produced the token.

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("failed to encode token: {0}")]
    Encoding(String),
    #[error("token is invalid or expired: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: client id or username, depending on the issuing flow.
    pub sub: String,
    pub scopes: Vec<String>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    #[must_use]
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }
}

pub struct JwtCodec {
    secret: String,
}

impl JwtCodec {
    #[must_use]
    pub fn new(secret: String) -> Self {
        Self { secret }
    }

    pub fn generate_token(&self, subject: &str, scopes: &[String], expiration_hours: i64) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            scopes: scopes.to_vec(),
            iat: now.timestamp(),
            exp: (now + chrono::Duration::hours(expiration_hours)).timestamp(),
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(self.secret.as_bytes()))
            .map_err(|e| JwtError::Encoding(e.to_string()))
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        decode::<Claims>(token, &DecodingKey::from_secret(self.secret.as_bytes()), &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| JwtError::Invalid(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_claims() {
        let codec = JwtCodec::new("a-sufficiently-long-test-secret".to_string());
        let token = codec.generate_token("client-1", &["backups:write".to_string()], 1).unwrap();
        let claims = codec.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "client-1");
        assert!(claims.has_scope("backups:write"));
    }

    #[test]
    fn rejects_token_signed_with_different_secret() {
        let codec_a = JwtCodec::new("secret-a-is-long-enough".to_string());
        let codec_b = JwtCodec::new("secret-b-is-long-enough".to_string());
        let token = codec_a.generate_token("client-1", &[], 1).unwrap();
        assert!(codec_b.validate_token(&token).is_err());
    }

    #[test]
    fn rejects_expired_token() {
        let codec = JwtCodec::new("a-sufficiently-long-test-secret".to_string());
        let token = codec.generate_token("client-1", &[], -1).unwrap();
        assert!(codec.validate_token(&token).is_err());
    }
}
