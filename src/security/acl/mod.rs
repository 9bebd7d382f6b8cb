//! Access control: per-user command/subcommand/key permissions,
//! password authentication, and the `ACL` admin command surface.
//!
//! `AclContext` is the single value a connection holds onto: the
//! command-ID allocator, the command registry, and the user registry
//! travel together because rule application needs all three at once.

pub mod admin;
pub mod auth;
pub mod authorize;
pub mod constant_time;
pub mod file;
pub mod ids;
pub mod registry;
pub mod rules;
pub mod user;

pub use auth::AuthError;
pub use authorize::AuthzError;
pub use file::AclFileError;
pub use ids::CommandIdAllocator;
pub use registry::{AlreadyExists, NotFound, UserRegistry, DEFAULT_USER};
pub use rules::SyntaxError;
pub use user::AclUser;

use crate::commands::{CommandDescriptor, CommandTable};
use crate::glob::Matcher;

/// Everything the ACL core needs, bundled into one value so callers
/// don't have to thread three collaborators through every call.
#[derive(Debug)]
pub struct AclContext {
    pub ids: CommandIdAllocator,
    pub table: CommandTable,
    pub registry: UserRegistry,
}

impl AclContext {
    pub fn new() -> Self {
        let mut ids = CommandIdAllocator::new();
        let table = CommandTable::builtin();
        let registry = UserRegistry::init(&mut ids, &table);
        Self {
            ids,
            table,
            registry,
        }
    }

    /// Authenticate `username`/`password` against the registry.
    pub fn authenticate(&self, username: &str, password: &[u8]) -> Result<(), AuthError> {
        auth::check(&self.registry, username, password)
    }

    /// Look up the command descriptor and its allocated ID together,
    /// the pair `authorize` needs.
    pub fn resolve_command(&mut self, name: &str) -> Option<(CommandDescriptor, u64)> {
        let descriptor = self.table.get(name)?.clone();
        let id = self.ids.id_of(descriptor.name);
        Some((descriptor, id))
    }

    /// Authorise a command invocation for `user` (`None` means an
    /// internal-origin request, always allowed).
    pub fn authorize(
        &mut self,
        username: Option<&str>,
        argv: &[Vec<u8>],
        matcher: &dyn Matcher,
    ) -> Result<(), AclError> {
        let Some(name) = argv.first() else {
            return Err(AclError::UnknownCommand(String::new()));
        };
        let name = String::from_utf8_lossy(name).to_ascii_lowercase();
        let Some((descriptor, cmd_id)) = self.resolve_command(&name) else {
            return Err(AclError::UnknownCommand(name));
        };

        let user = match username {
            Some(u) => Some(self.registry.lookup(u).map_err(|_| AclError::NoSuchUser(u.to_string()))?),
            None => None,
        };

        authorize::authorize(user, &descriptor, cmd_id, argv, matcher)
            .map_err(AclError::Denied)
    }
}

impl Default for AclContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors surfaced by the connection-facing `AclContext` API. These
/// wrap the narrower per-module errors with the context (username,
/// command name) a caller needs to format a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AclError {
    UnknownCommand(String),
    NoSuchUser(String),
    Denied(AuthzError),
}

impl std::fmt::Display for AclError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AclError::UnknownCommand(name) => write!(f, "ERR unknown command '{}'", name),
            AclError::NoSuchUser(name) => write!(f, "ERR user '{}' not found", name),
            AclError::Denied(AuthzError::DeniedCommand) => write!(
                f,
                "NOPERM this user has no permissions to run this command"
            ),
            AclError::Denied(AuthzError::DeniedKey) => write!(
                f,
                "NOPERM this user has no permissions to access one of the keys used as arguments"
            ),
        }
    }
}

impl std::error::Error for AclError {}
