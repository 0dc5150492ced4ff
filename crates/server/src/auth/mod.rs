pub mod jwt;
pub mod password;

pub use jwt::{Claims, JwtCodec, JwtError};
pub use password::{PasswordError, PasswordHasher};

pub const SCOPE_BACKUPS_WRITE: &str = "backups:write";
pub const SCOPE_RESTORES_WRITE: &str = "restores:write";
pub const SCOPE_CLEANUP_WRITE: &str = "cleanup:write";
pub const SCOPE_STATUS_READ: &str = "status:read";

/// Scopes granted to an operator authenticating via username/password —
/// the full operating surface, since there is no finer-grained role model.
pub const ALL_SCOPES: &[&str] =
    &[SCOPE_BACKUPS_WRITE, SCOPE_RESTORES_WRITE, SCOPE_CLEANUP_WRITE, SCOPE_STATUS_READ];
