//! The `AuthCode` entity: a short-lived authorization code.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default lifetime of an authorization code, per the authorization-code flow.
pub const AUTH_CODE_TTL_SECS: i64 = 10 * 60;

/// An authorization code issued on user login, consumed exactly once by
/// `POST /auth/token`. `scopes` is stored as a JSON array column, so this
/// type does not derive `sqlx::FromRow` directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthCode {
    pub code: String,
    pub username: String,
    pub scopes: Vec<String>,
    pub expires_at: i64,
}

impl AuthCode {
    #[must_use]
    pub fn new(code: String, username: String, scopes: Vec<String>, now: DateTime<Utc>) -> Self {
        Self { code, username, scopes, expires_at: (now + chrono::Duration::seconds(AUTH_CODE_TTL_SECS)).timestamp() }
    }

    /// Stored expiry is authoritative: a read that finds an expired row
    /// deletes it and reports not-found, rather than trusting wall-clock
    /// skew on the comparison side.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now.timestamp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_code_is_not_expired() {
        let now = Utc::now();
        let code = AuthCode::new("abc".into(), "alice".into(), vec![], now);
        assert!(!code.is_expired(now));
    }

    #[test]
    fn code_expires_after_ttl() {
        let now = Utc::now();
        let code = AuthCode::new("abc".into(), "alice".into(), vec![], now);
        let later = now + chrono::Duration::seconds(AUTH_CODE_TTL_SECS + 1);
        assert!(code.is_expired(later));
    }
}
