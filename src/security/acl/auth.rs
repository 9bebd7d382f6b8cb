//! Credential check.

use super::constant_time::ct_eq;
use super::registry::UserRegistry;
use super::user::AclUser;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    NotFound,
    BadCredentials,
}

/// A sentinel compared against when a user has no passwords and is not
/// `nopass`, so that "no passwords configured" and "wrong password"
/// take the same code path through the constant-time compare: every
/// terminating path executes at least one comparison.
const SENTINEL: &[u8] = b"\0acl-sentinel-no-password-configured\0";

/// `Check(username, password) -> Ok | NotFound | BadCredentials`.
pub fn check(registry: &UserRegistry, username: &str, password: &[u8]) -> Result<(), AuthError> {
    let user = registry.lookup(username).map_err(|_| AuthError::NotFound)?;
    check_user(user, password)
}

fn check_user(user: &AclUser, password: &[u8]) -> Result<(), AuthError> {
    if !user.enabled() {
        return Err(AuthError::BadCredentials);
    }
    if user.has_nopass() {
        return Ok(());
    }

    let passwords = user.passwords();
    if passwords.is_empty() {
        return if ct_eq(password, SENTINEL) {
            Ok(())
        } else {
            Err(AuthError::BadCredentials)
        };
    }

    let mut matched = false;
    for stored in passwords {
        if ct_eq(password, stored) {
            matched = true;
        }
    }
    if matched {
        Ok(())
    } else {
        Err(AuthError::BadCredentials)
    }
}
