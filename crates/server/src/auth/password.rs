//! bcrypt hashing for `Client.secret_hash` and `User.password_hash`.

use bcrypt::{hash, verify, DEFAULT_COST};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("password hashing failed")]
    HashingFailed,
    #[error("password verification failed")]
    VerificationFailed,
    #[error("password must not be empty")]
    Empty,
}

pub struct PasswordHasher;

impl PasswordHasher {
    pub fn hash(password: &str) -> Result<String, PasswordError> {
        if password.is_empty() {
            return Err(PasswordError::Empty);
        }
        hash(password, DEFAULT_COST).map_err(|_| PasswordError::HashingFailed)
    }

    pub fn verify(password: &str, hash: &str) -> Result<bool, PasswordError> {
        verify(password, hash).map_err(|_| PasswordError::VerificationFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_round_trips() {
        let hashed = PasswordHasher::hash("correct horse battery staple").unwrap();
        assert!(PasswordHasher::verify("correct horse battery staple", &hashed).unwrap());
        assert!(!PasswordHasher::verify("wrong", &hashed).unwrap());
    }

    #[test]
    fn empty_password_rejected() {
        assert!(matches!(PasswordHasher::hash(""), Err(PasswordError::Empty)));
    }
}
