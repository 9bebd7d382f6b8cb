//! Per-connection state: the bound username and the AUTH/command
//! dispatch glue between a client's argument vector and the ACL core.

use crate::glob::Matcher;
use crate::reply::Reply;
use crate::security::acl::{registry::DEFAULT_USER, AclContext, AclError};
use tracing::{info, warn};

/// A client connection's ACL-relevant state.
///
/// Holds the bound username *by value*, not a reference into the
/// registry: every authorization check re-resolves the user by name,
/// so `ACL DELUSER` on a bound user is observed on the connection's
/// very next command rather than leaving it pointing at stale state.
///
/// `username` is `None` only for internal-origin requests (§4.G step
/// 1 of the ACL design), which this client-facing type never
/// represents — every accepted connection is bound to `default` per
/// the "bound user" invariant (§3.6) until `AUTH` rebinds it, so a
/// connection is never passed through as the unconditional-allow case.
#[derive(Debug, Clone)]
pub struct Connection {
    username: Option<String>,
}

impl Connection {
    /// A freshly accepted connection is bound to `default` until
    /// `AUTH` rebinds it. Whether `default` can actually run commands
    /// depends on its configured rules (`nopass` plus whatever
    /// `ACL SETUSER default ...` has applied).
    pub fn new() -> Self {
        Self {
            username: Some(DEFAULT_USER.to_string()),
        }
    }

    pub fn bound_username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// `AUTH <password>` (binds to `default`) or `AUTH <user> <pass>`.
    pub fn handle_auth(&mut self, ctx: &AclContext, args: &[&[u8]]) -> Reply {
        let (username, password): (&str, &[u8]) = match args {
            [password] => (DEFAULT_USER, password),
            [user, password] => match std::str::from_utf8(user) {
                Ok(u) => (u, *password),
                Err(_) => return Reply::err("ERR invalid username encoding"),
            },
            _ => return Reply::err("ERR wrong number of arguments for 'auth' command"),
        };

        match ctx.authenticate(username, password) {
            Ok(()) => {
                self.username = Some(username.to_string());
                info!(user = username, "connection authenticated");
                Reply::ok()
            }
            Err(_) => {
                warn!(user = username, "authentication failed");
                Reply::err("WRONGPASS invalid username-password pair or user is disabled.")
            }
        }
    }

    /// Authorize `argv` (command name at position 0) for this
    /// connection's currently bound user, then leave dispatch to the
    /// caller. Returns `Ok(())` when the command may proceed.
    pub fn authorize(
        &self,
        ctx: &mut AclContext,
        argv: &[Vec<u8>],
        matcher: &dyn Matcher,
    ) -> Result<(), Reply> {
        match ctx.authorize(self.username.as_deref(), argv, matcher) {
            Ok(()) => Ok(()),
            Err(e @ AclError::Denied(_)) => {
                warn!(user = ?self.username, error = %e, "command denied");
                Err(Reply::err(format!("{}", e)))
            }
            Err(e) => Err(Reply::err(format!("{}", e))),
        }
    }
}

impl Default for Connection {
    fn default() -> Self {
        Self::new()
    }
}
