//! `ACL` admin command surface: `HELP`, `LIST`, `USERS`, `SETUSER`,
//! `DELUSER`, `GETUSER`, `WHOAMI`, `CAT`, `GENPASS`.
//!
//! Each handler takes the pieces an `AclContext` bundles and returns a
//! `Reply` frame, so the connection layer only has to dispatch on the
//! subcommand name.

use super::registry::UserRegistry;
use super::rules::apply_rules;
use super::user::AclUser;
use super::AclContext;
use crate::reply::Reply;
use rand::RngCore;

pub fn help() -> Reply {
    Reply::array_of_bulks([
        "ACL <subcommand> [<arg> [value] [opt] ...]. Subcommands are:",
        "CAT [<category>]",
        "    List all commands that belong to <category>, or all categories",
        "    when no category is given.",
        "DELUSER <username> [<username> ...]",
        "    Delete a list of users.",
        "GENPASS [<bits>]",
        "    Generate a secure random password.",
        "GETUSER <username>",
        "    Get the user's details.",
        "LIST",
        "    Show users details in config file format.",
        "SETUSER <username> [attribs ...]",
        "    Create or modify a user with the specified attributes.",
        "USERS",
        "    List all the registered usernames.",
        "WHOAMI",
        "    Return the current connection username.",
    ])
}

pub fn whoami(username: Option<&str>) -> Reply {
    match username {
        Some(name) => Reply::bulk(name),
        None => Reply::NullBulk,
    }
}

pub fn users(registry: &UserRegistry) -> Reply {
    let mut names = registry.names();
    names.sort_unstable();
    Reply::array_of_bulks(names)
}

pub fn list(registry: &UserRegistry) -> Reply {
    let mut users: Vec<&AclUser> = registry.iter().collect();
    users.sort_unstable_by(|a, b| a.name().cmp(b.name()));
    Reply::Array(
        users
            .into_iter()
            .map(|u| Reply::bulk(describe_user(u)))
            .collect(),
    )
}

pub fn getuser(registry: &UserRegistry, username: &str) -> Reply {
    let Ok(user) = registry.lookup(username) else {
        return Reply::NullBulk;
    };

    let mut flags = vec![if user.enabled() { "on" } else { "off" }.to_string()];
    if user.has_allkeys() {
        flags.push("allkeys".to_string());
    }
    if user.has_allcommands() {
        flags.push("allcommands".to_string());
    }
    if user.has_nopass() {
        flags.push("nopass".to_string());
    }

    let passwords = user
        .passwords()
        .iter()
        .map(|p| Reply::bulk(hex(p)))
        .collect::<Vec<_>>();

    let keys = if user.has_allkeys() {
        "~*".to_string()
    } else {
        user.patterns()
            .iter()
            .map(|p| format!("~{}", String::from_utf8_lossy(p)))
            .collect::<Vec<_>>()
            .join(" ")
    };

    Reply::Map(vec![
        ("flags".to_string(), Reply::array_of_bulks(flags)),
        ("passwords".to_string(), Reply::Array(passwords)),
        ("commands".to_string(), Reply::bulk(describe_commands(user))),
        ("keys".to_string(), Reply::bulk(keys)),
    ])
}

pub fn setuser(ctx: &mut AclContext, username: &str, tokens: &[&[u8]]) -> Reply {
    let user = ctx.registry.get_or_create(username);
    match apply_rules(user, &mut ctx.ids, &ctx.table, tokens.iter().copied()) {
        Ok(()) => Reply::ok(),
        Err(e) => Reply::err(format!("ERR Error in ACL SETUSER modifier: {}", e)),
    }
}

pub fn deluser(registry: &mut UserRegistry, usernames: &[&str]) -> Reply {
    let mut deleted: i64 = 0;
    for name in usernames {
        if registry.delete(name).is_ok() {
            deleted += 1;
        }
    }
    Reply::Simple(deleted.to_string())
}

pub fn cat(ctx: &AclContext, category: Option<&str>) -> Reply {
    match category {
        None => Reply::array_of_bulks([
            "set", "sortedset", "list", "hash", "string", "bitmap", "hyperloglog", "stream",
            "admin", "readonly", "readwrite", "fast", "slow", "pubsub",
        ]),
        Some(cat) => match ctx.table.category_from_str(cat) {
            Some(category) => Reply::array_of_bulks(ctx.table.commands_in_category(category)),
            None => Reply::err(format!("ERR Unknown ACL cat '{}'", cat)),
        },
    }
}

/// Generate a random hex password of the given bit length (rounded up
/// to a whole byte), defaulting to 256 bits and capped at 4096 like
/// Redis's `ACL GENPASS`.
pub fn genpass(bits: Option<u32>) -> Reply {
    let bits = bits.unwrap_or(256).min(4096);
    let byte_len = bits.div_ceil(8) as usize;
    let mut bytes = vec![0u8; byte_len];
    rand::thread_rng().fill_bytes(&mut bytes);
    Reply::bulk(bytes.iter().map(|b| format!("{:02x}", b)).collect::<String>())
}

fn describe_user(user: &AclUser) -> String {
    let mut parts = vec![
        "user".to_string(),
        user.name().to_string(),
        if user.enabled() { "on" } else { "off" }.to_string(),
    ];
    if user.has_nopass() {
        parts.push("nopass".to_string());
    }
    for p in user.passwords() {
        parts.push(format!("#{}", hex(p)));
    }
    if user.has_allkeys() {
        parts.push("~*".to_string());
    } else {
        for pat in user.patterns() {
            parts.push(format!("~{}", String::from_utf8_lossy(pat)));
        }
    }
    parts.push(describe_commands(user));
    parts.join(" ")
}

fn describe_commands(user: &AclUser) -> String {
    if user.has_allcommands() {
        "+@all".to_string()
    } else {
        "-@all".to_string()
    }
}

/// `ACL GETUSER`/`ACL LIST` report passwords hex-encoded rather than
/// as raw bytes, matching `file.rs`'s on-disk rendering. Display-only:
/// no hash is computed and nothing is ever compared against this form.
fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::acl::AclContext;

    #[test]
    fn whoami_reports_bound_username() {
        assert_eq!(whoami(Some("alice")), Reply::bulk("alice"));
        assert_eq!(whoami(None), Reply::NullBulk);
    }

    #[test]
    fn users_lists_default_plus_created() {
        let mut ctx = AclContext::new();
        ctx.registry.create("alice").unwrap();
        let reply = users(&ctx.registry);
        match reply {
            Reply::Array(items) => assert_eq!(items.len(), 2),
            _ => panic!("expected array"),
        }
    }

    #[test]
    fn setuser_creates_and_applies_rules() {
        let mut ctx = AclContext::new();
        let reply = setuser(&mut ctx, "bob", &[b"on", b">secret", b"~cache:*", b"+get"]);
        assert_eq!(reply, Reply::ok());
        assert!(ctx.registry.lookup("bob").is_ok());
    }

    #[test]
    fn setuser_surfaces_syntax_errors() {
        let mut ctx = AclContext::new();
        let reply = setuser(&mut ctx, "bob", &[b"!!!not-a-rule"]);
        assert!(matches!(reply, Reply::Error(_)));
    }

    #[test]
    fn deluser_refuses_default() {
        let mut ctx = AclContext::new();
        let reply = deluser(&mut ctx.registry, &["default"]);
        assert_eq!(reply, Reply::Simple("0".to_string()));
    }

    #[test]
    fn getuser_unknown_is_null() {
        let ctx = AclContext::new();
        assert_eq!(getuser(&ctx.registry, "nobody"), Reply::NullBulk);
    }

    #[test]
    fn cat_without_argument_lists_categories() {
        let ctx = AclContext::new();
        match cat(&ctx, None) {
            Reply::Array(items) => assert!(!items.is_empty()),
            _ => panic!("expected array"),
        }
    }

    #[test]
    fn cat_with_unknown_category_errors() {
        let ctx = AclContext::new();
        assert!(matches!(cat(&ctx, Some("bogus")), Reply::Error(_)));
    }

    #[test]
    fn genpass_returns_expected_hex_length() {
        match genpass(Some(256)) {
            Reply::Bulk(Some(bytes)) => assert_eq!(bytes.len(), 64),
            _ => panic!("expected bulk reply"),
        }
        match genpass(None) {
            Reply::Bulk(Some(bytes)) => assert_eq!(bytes.len(), 64),
            _ => panic!("expected bulk reply"),
        }
    }
}
