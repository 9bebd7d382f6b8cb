//! Rule parser / applier.

use super::constant_time::ct_eq;
use super::ids::CommandIdAllocator;
use super::user::{AclUser, UserFlags};
use crate::commands::CommandTable;

/// A rule token was not recognised, or malformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub token: String,
}

impl std::fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Syntax error in ACL SETUSER modifier '{}'",
            self.token
        )
    }
}

impl std::error::Error for SyntaxError {}

/// Apply a single rule token to `user`, consulting `ids` to resolve
/// command names to IDs and `table` to resolve `@category` rules and
/// `cmd|sub` bookkeeping.
///
/// Tokens are byte sequences (passwords may be binary); `token` is
/// passed as `&[u8]` so binary passwords round-trip, but keyword
/// recognition (`on`, `off`, `nopass`, ...) is ASCII case-insensitive.
pub fn apply_rule(
    user: &mut AclUser,
    ids: &mut CommandIdAllocator,
    table: &CommandTable,
    token: &[u8],
) -> Result<(), SyntaxError> {
    let err = || SyntaxError {
        token: String::from_utf8_lossy(token).into_owned(),
    };

    if eq_ignore_case(token, b"on") {
        user.flags.set(UserFlags::ENABLED);
        return Ok(());
    }
    if eq_ignore_case(token, b"off") {
        user.flags.clear(UserFlags::ENABLED);
        return Ok(());
    }
    if eq_ignore_case(token, b"allkeys") || token == b"~*" {
        user.flags.set(UserFlags::ALLKEYS);
        user.patterns.clear();
        return Ok(());
    }
    if eq_ignore_case(token, b"allcommands") || eq_ignore_case(token, b"+@all") {
        user.flags.set(UserFlags::ALLCOMMANDS);
        user.allowed_commands.set_all();
        return Ok(());
    }
    if eq_ignore_case(token, b"nopass") {
        user.flags.set(UserFlags::NOPASS);
        user.passwords.clear();
        return Ok(());
    }
    if eq_ignore_case(token, b"resetpass") {
        user.flags.clear(UserFlags::NOPASS);
        user.passwords.clear();
        return Ok(());
    }
    if eq_ignore_case(token, b"resetkeys") {
        user.flags.clear(UserFlags::ALLKEYS);
        user.patterns.clear();
        return Ok(());
    }
    if eq_ignore_case(token, b"reset") {
        apply_rule(user, ids, table, b"resetpass")?;
        apply_rule(user, ids, table, b"resetkeys")?;
        apply_rule(user, ids, table, b"off")?;
        apply_rule(user, ids, table, b"-@all")?;
        return Ok(());
    }

    match token.first() {
        Some(b'>') => {
            let pass = &token[1..];
            if !user.passwords.iter().any(|p| ct_eq(p, pass)) {
                user.passwords.push(pass.to_vec());
            }
            user.flags.clear(UserFlags::NOPASS);
            Ok(())
        }
        Some(b'<') => {
            let pass = &token[1..];
            user.passwords.retain(|p| !ct_eq(p, pass));
            Ok(())
        }
        Some(b'~') => {
            let pat = &token[1..];
            if !user.patterns.iter().any(|p| p.as_slice() == pat) {
                user.patterns.push(pat.to_vec());
            }
            user.flags.clear(UserFlags::ALLKEYS);
            Ok(())
        }
        Some(b'+') => apply_plus(user, ids, table, &token[1..]).ok_or_else(err),
        Some(b'-') => apply_minus(user, ids, table, &token[1..]).ok_or_else(err),
        _ => Err(err()),
    }
}

fn apply_plus(
    user: &mut AclUser,
    ids: &mut CommandIdAllocator,
    table: &CommandTable,
    rest: &[u8],
) -> Option<()> {
    if rest.first() == Some(&b'@') {
        let cat = std::str::from_utf8(&rest[1..]).ok()?;
        let category = table.category_from_str(cat)?;
        for name in table.commands_in_category(category) {
            let id = ids.id_of(name);
            user.allowed_commands.set(id);
        }
        return Some(());
    }

    let rest = std::str::from_utf8(rest).ok()?;
    if let Some((cmd, sub)) = rest.split_once('|') {
        user.allowed_subcommands
            .entry(ids.id_of(cmd))
            .or_default()
            .push(sub.to_string());
        return Some(());
    }

    let id = ids.id_of(rest);
    user.allowed_commands.set(id);
    Some(())
}

fn apply_minus(
    user: &mut AclUser,
    ids: &mut CommandIdAllocator,
    table: &CommandTable,
    rest: &[u8],
) -> Option<()> {
    if rest.first() == Some(&b'@') {
        let cat = std::str::from_utf8(&rest[1..]).ok()?;
        let category = table.category_from_str(cat)?;
        if category == crate::commands::Category::All {
            // Mirror `+@all`'s `set_all()`: clear the whole bitmap
            // rather than just the sampled command table's bits, so
            // `-@all` (and `reset`, which applies it) is the exact
            // inverse of `+@all`/`allcommands`.
            user.allowed_commands.clear_all();
        } else {
            for name in table.commands_in_category(category) {
                let id = ids.id_of(name);
                user.allowed_commands.clear(id);
            }
        }
        user.flags.clear(UserFlags::ALLCOMMANDS);
        return Some(());
    }

    let rest = std::str::from_utf8(rest).ok()?;
    let id = ids.id_of(rest);
    user.allowed_commands.clear(id);
    user.flags.clear(UserFlags::ALLCOMMANDS);
    Some(())
}

fn eq_ignore_case(token: &[u8], keyword: &[u8]) -> bool {
    token.eq_ignore_ascii_case(keyword)
}

/// Apply a sequence of rules in order, stopping at the first error.
/// Rules already applied before the failing one are not rolled back.
pub fn apply_rules<'a, I>(
    user: &mut AclUser,
    ids: &mut CommandIdAllocator,
    table: &CommandTable,
    tokens: I,
) -> Result<(), SyntaxError>
where
    I: IntoIterator<Item = &'a [u8]>,
{
    for token in tokens {
        apply_rule(user, ids, table, token)?;
    }
    Ok(())
}
