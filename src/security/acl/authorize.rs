//! Authorisation check.

use super::user::{AclUser, MAX_CMD_BITS};
use crate::commands::{CommandDescriptor, CommandKind};
use crate::glob::Matcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthzError {
    DeniedCommand,
    DeniedKey,
}

/// `Authorise(client) -> Ok | DeniedCommand | DeniedKey`.
///
/// `user` is `None` for internal-origin requests (step 1). `cmd_id` is
/// the command's allocated ID (looked up ahead of time via the
/// command-ID allocator, `ids.rs`); `argv` is the full argument vector
/// including the command name at position 0.
pub fn authorize(
    user: Option<&AclUser>,
    cmd: &CommandDescriptor,
    cmd_id: u64,
    argv: &[Vec<u8>],
    matcher: &dyn Matcher,
) -> Result<(), AuthzError> {
    let Some(user) = user else {
        return Ok(());
    };

    if cmd_id >= MAX_CMD_BITS as u64 {
        return Err(AuthzError::DeniedCommand);
    }

    // Command permission gate.
    if !user.has_allcommands() && cmd.kind != CommandKind::Auth {
        let allowed_by_bit = user.command_allowed_bit(cmd_id);
        if !allowed_by_bit {
            let allowed_by_sub = argv.len() >= 2
                && std::str::from_utf8(&argv[1])
                    .is_ok_and(|sub| user.subcommand_allowed(cmd_id, sub));
            if !allowed_by_sub {
                return Err(AuthzError::DeniedCommand);
            }
        }
    }

    // Key permission gate.
    if !user.has_allkeys() && cmd.keys.has_keys() {
        for pos in cmd.keys.key_positions(argv.len()) {
            let key = &argv[pos];
            let key_matches = user
                .patterns()
                .iter()
                .any(|pat| matcher.matches(pat, key));
            if !key_matches {
                return Err(AuthzError::DeniedKey);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::CommandTable;
    use crate::glob::GlobMatcher;
    use crate::security::acl::ids::CommandIdAllocator;
    use crate::security::acl::rules::apply_rules;

    fn argv(parts: &[&str]) -> Vec<Vec<u8>> {
        parts.iter().map(|s| s.as_bytes().to_vec()).collect()
    }

    #[test]
    fn no_user_is_always_allowed() {
        let table = CommandTable::builtin();
        let cmd = table.get("set").unwrap();
        let result = authorize(None, cmd, 0, &argv(&["SET", "k", "v"]), &GlobMatcher);
        assert!(result.is_ok());
    }

    #[test]
    fn command_id_overflow_is_denied() {
        let table = CommandTable::builtin();
        let cmd = table.get("get").unwrap();
        let mut u = AclUser::new("u");
        u.flags.set(super::super::user::UserFlags::ALLCOMMANDS);
        u.flags.set(super::super::user::UserFlags::ALLKEYS);
        let result = authorize(
            Some(&u),
            cmd,
            MAX_CMD_BITS as u64,
            &argv(&["GET", "k"]),
            &GlobMatcher,
        );
        assert_eq!(result.unwrap_err(), AuthzError::DeniedCommand);
    }

    #[test]
    fn command_gate_precedes_key_gate() {
        let mut ids = CommandIdAllocator::new();
        let table = CommandTable::builtin();
        let mut u = AclUser::new("u");
        apply_rules(&mut u, &mut ids, &table, [b"~nomatch:*".as_slice()]).unwrap();
        let cmd = table.get("get").unwrap();
        let get_id = ids.id_of("get");
        // No command bit set at all -> DeniedCommand, even though keys
        // would also fail.
        let result = authorize(
            Some(&u),
            cmd,
            get_id,
            &argv(&["GET", "other:1"]),
            &GlobMatcher,
        );
        assert_eq!(result.unwrap_err(), AuthzError::DeniedCommand);
    }

    #[test]
    fn allowed_command_but_unmatched_key_is_denied_key() {
        let mut ids = CommandIdAllocator::new();
        let table = CommandTable::builtin();
        let mut u = AclUser::new("u");
        apply_rules(
            &mut u,
            &mut ids,
            &table,
            [b"+get".as_slice(), b"~user:*".as_slice()],
        )
        .unwrap();
        let cmd = table.get("get").unwrap();
        let get_id = ids.id_of("get");
        let result = authorize(
            Some(&u),
            cmd,
            get_id,
            &argv(&["GET", "admin:1"]),
            &GlobMatcher,
        );
        assert_eq!(result.unwrap_err(), AuthzError::DeniedKey);

        let result = authorize(
            Some(&u),
            cmd,
            get_id,
            &argv(&["GET", "user:1"]),
            &GlobMatcher,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn subcommand_allowlist_consulted_when_top_level_bit_unset() {
        let mut ids = CommandIdAllocator::new();
        let table = CommandTable::builtin();
        let mut u = AclUser::new("u");
        apply_rules(
            &mut u,
            &mut ids,
            &table,
            [b"+debug|sleep".as_slice(), b"allkeys".as_slice()],
        )
        .unwrap();
        let cmd = table.get("debug").unwrap();
        let debug_id = ids.id_of("debug");

        let ok = authorize(
            Some(&u),
            cmd,
            debug_id,
            &argv(&["DEBUG", "SLEEP", "0"]),
            &GlobMatcher,
        );
        assert!(ok.is_ok());

        let denied = authorize(
            Some(&u),
            cmd,
            debug_id,
            &argv(&["DEBUG", "OBJECT", "x"]),
            &GlobMatcher,
        );
        assert_eq!(denied.unwrap_err(), AuthzError::DeniedCommand);
    }

    #[test]
    fn commands_without_keys_never_deny_on_keys() {
        let mut ids = CommandIdAllocator::new();
        let table = CommandTable::builtin();
        let mut u = AclUser::new("u");
        apply_rules(&mut u, &mut ids, &table, [b"+ping".as_slice()]).unwrap();
        let cmd = table.get("ping").unwrap();
        let ping_id = ids.id_of("ping");
        let result = authorize(Some(&u), cmd, ping_id, &argv(&["PING"]), &GlobMatcher);
        assert!(result.is_ok());
    }

    #[test]
    fn auth_command_bypasses_command_gate() {
        let mut ids = CommandIdAllocator::new();
        let table = CommandTable::builtin();
        // A user with no command permissions at all.
        let mut u = AclUser::new("u");
        apply_rules(&mut u, &mut ids, &table, [b"allkeys".as_slice()]).unwrap();
        let cmd = table.get("auth").unwrap();
        let auth_id = ids.id_of("auth");
        let result = authorize(
            Some(&u),
            cmd,
            auth_id,
            &argv(&["AUTH", "x", "y"]),
            &GlobMatcher,
        );
        assert!(result.is_ok());
    }
}
