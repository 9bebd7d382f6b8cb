//! Environment-driven configuration, in the style of the teacher's
//! `ServerConfig`: one struct, one `from_env` constructor, sane
//! defaults when a variable is unset or unparsable.

use std::path::PathBuf;

/// Configuration for the ACL subsystem's standalone demo front end.
#[derive(Debug, Clone)]
pub struct AclServerConfig {
    /// Path to a Redis-style ACL file to load at startup, if any.
    pub acl_file: Option<PathBuf>,
    /// Whether unauthenticated connections are rejected outright
    /// rather than falling back to the `default` user.
    pub require_auth: bool,
    /// Whether the `default` user is seeded `nopass` (the Redis
    /// default) or left passwordless-but-disabled-for-auth.
    pub default_user_nopass: bool,
}

impl AclServerConfig {
    pub fn from_env() -> Self {
        Self {
            acl_file: std::env::var("ACL_FILE").ok().map(PathBuf::from),
            require_auth: parse_bool_env("ACL_REQUIRE_AUTH", false),
            default_user_nopass: parse_bool_env("ACL_DEFAULT_USER_NOPASS", true),
        }
    }
}

impl Default for AclServerConfig {
    fn default() -> Self {
        Self {
            acl_file: None,
            require_auth: false,
            default_user_nopass: true,
        }
    }
}

fn parse_bool_env(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(v) => matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_redis_convention() {
        let cfg = AclServerConfig::default();
        assert!(cfg.acl_file.is_none());
        assert!(!cfg.require_auth);
        assert!(cfg.default_user_nopass);
    }

    #[test]
    fn parse_bool_env_accepts_common_spellings() {
        std::env::set_var("ACL_TEST_BOOL_TRUE", "yes");
        std::env::set_var("ACL_TEST_BOOL_FALSE", "nope");
        assert!(parse_bool_env("ACL_TEST_BOOL_TRUE", false));
        assert!(!parse_bool_env("ACL_TEST_BOOL_FALSE", true));
        std::env::remove_var("ACL_TEST_BOOL_TRUE");
        std::env::remove_var("ACL_TEST_BOOL_FALSE");
    }
}
