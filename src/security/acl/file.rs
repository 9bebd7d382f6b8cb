//! ACL file loading and saving.
//!
//! File format (one user per line, `#`-comments and blank lines
//! skipped):
//! ```text
//! user <username> <rule> <rule> ...
//! ```
//!
//! Example:
//! ```text
//! user default on nopass ~* +@all
//! user alice on >secretpassword ~cache:* +@read -@dangerous
//! ```

use super::ids::CommandIdAllocator;
use super::registry::UserRegistry;
use super::rules::{apply_rules, SyntaxError};
use super::user::AclUser;
use crate::commands::CommandTable;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

#[derive(Debug)]
pub enum AclFileError {
    Io {
        path: String,
        source: std::io::Error,
    },
    Parse {
        path: String,
        line_number: usize,
        line: String,
        reason: String,
    },
    Rule {
        path: String,
        line_number: usize,
        error: SyntaxError,
    },
}

impl std::fmt::Display for AclFileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AclFileError::Io { path, source } => {
                write!(f, "failed to access ACL file '{}': {}", path, source)
            }
            AclFileError::Parse {
                path,
                line_number,
                line,
                reason,
            } => write!(
                f,
                "parse error in ACL file '{}' line {}: {} (line: '{}')",
                path, line_number, reason, line
            ),
            AclFileError::Rule {
                path,
                line_number,
                error,
            } => write!(
                f,
                "ACL rule error in '{}' line {}: {}",
                path, line_number, error
            ),
        }
    }
}

impl std::error::Error for AclFileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AclFileError::Io { source, .. } => Some(source),
            AclFileError::Rule { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Load users from an ACL file into `registry`, allocating command IDs
/// as rules reference them. Existing users with the same name are
/// overwritten.
pub fn load_acl_file(
    path: impl AsRef<Path>,
    registry: &mut UserRegistry,
    ids: &mut CommandIdAllocator,
    table: &CommandTable,
) -> Result<(), AclFileError> {
    let path = path.as_ref();
    let path_str = path.display().to_string();

    let file = File::open(path).map_err(|e| AclFileError::Io {
        path: path_str.clone(),
        source: e,
    })?;

    for (line_number, line_result) in BufReader::new(file).lines().enumerate() {
        let line_number = line_number + 1;
        let line = line_result.map_err(|e| AclFileError::Io {
            path: path_str.clone(),
            source: e,
        })?;

        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut parts = trimmed.split_whitespace();
        let keyword = parts.next().unwrap_or("");
        if !keyword.eq_ignore_ascii_case("user") {
            return Err(AclFileError::Parse {
                path: path_str,
                line_number,
                line: trimmed.to_string(),
                reason: "line must start with 'user'".to_string(),
            });
        }
        let username = parts.next().ok_or_else(|| AclFileError::Parse {
            path: path_str.clone(),
            line_number,
            line: trimmed.to_string(),
            reason: "missing username after 'user'".to_string(),
        })?;

        let user = registry.get_or_create(username);
        let tokens: Vec<&[u8]> = parts.map(str::as_bytes).collect();
        apply_rules(user, ids, table, tokens).map_err(|error| AclFileError::Rule {
            path: path_str.clone(),
            line_number,
            error,
        })?;
    }

    Ok(())
}

/// Save every user in `registry` to `path` in the format `load_acl_file`
/// reads back.
pub fn save_acl_file(path: impl AsRef<Path>, registry: &UserRegistry) -> Result<(), AclFileError> {
    let path = path.as_ref();
    let path_str = path.display().to_string();

    let mut file = File::create(path).map_err(|e| AclFileError::Io {
        path: path_str.clone(),
        source: e,
    })?;

    let mut names = registry.names();
    names.sort_unstable();
    for name in names {
        let user = registry.lookup(name).expect("name came from registry.names()");
        writeln!(file, "{}", render_user_line(user)).map_err(|e| AclFileError::Io {
            path: path_str.clone(),
            source: e,
        })?;
    }

    Ok(())
}

fn render_user_line(user: &AclUser) -> String {
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
        for pattern in user.patterns() {
            parts.push(format!("~{}", String::from_utf8_lossy(pattern)));
        }
    }
    parts.push(if user.has_allcommands() {
        "+@all".to_string()
    } else {
        "-@all".to_string()
    });
    parts.join(" ")
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    fn setup() -> (CommandIdAllocator, CommandTable, UserRegistry) {
        let mut ids = CommandIdAllocator::new();
        let table = CommandTable::builtin();
        let registry = UserRegistry::init(&mut ids, &table);
        (ids, table, registry)
    }

    #[test]
    fn loads_users_from_file() {
        let (mut ids, table, mut registry) = setup();
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# a comment").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "user alice on >secret ~cache:* +get").unwrap();
        writeln!(file, "user bob off").unwrap();
        file.flush().unwrap();

        load_acl_file(file.path(), &mut registry, &mut ids, &table).unwrap();

        let alice = registry.lookup("alice").unwrap();
        assert!(alice.enabled());
        assert_eq!(alice.passwords().len(), 1);

        let bob = registry.lookup("bob").unwrap();
        assert!(!bob.enabled());
    }

    #[test]
    fn rejects_line_not_starting_with_user() {
        let (mut ids, table, mut registry) = setup();
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not-a-user-line").unwrap();
        file.flush().unwrap();
        let err = load_acl_file(file.path(), &mut registry, &mut ids, &table).unwrap_err();
        assert!(matches!(err, AclFileError::Parse { .. }));
    }

    #[test]
    fn round_trips_through_save_and_load() {
        let (mut ids, table, mut registry) = setup();
        registry.create("carol").unwrap();
        {
            let carol = registry.lookup_mut("carol").unwrap();
            apply_rules(
                carol,
                &mut ids,
                &table,
                [b"on".as_slice(), b">pw".as_slice(), b"~user:*".as_slice()],
            )
            .unwrap();
        }

        let out = NamedTempFile::new().unwrap();
        save_acl_file(out.path(), &registry).unwrap();

        let mut ids2 = CommandIdAllocator::new();
        let mut registry2 = UserRegistry::init(&mut ids2, &table);
        load_acl_file(out.path(), &mut registry2, &mut ids2, &table).unwrap();

        let carol2 = registry2.lookup("carol").unwrap();
        assert!(carol2.enabled());
        assert_eq!(carol2.passwords().len(), 1);
    }
}
