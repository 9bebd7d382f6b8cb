//! User registry.

use super::ids::CommandIdAllocator;
use super::rules::apply_rules;
use super::user::AclUser;
use crate::commands::CommandTable;
use std::collections::HashMap;

pub const DEFAULT_USER: &str = "default";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlreadyExists;

impl std::fmt::Display for AlreadyExists {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "user already exists")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotFound;

impl std::fmt::Display for NotFound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "user not found")
    }
}

/// Name → user mapping. Owns the `default` user, which always exists.
#[derive(Debug)]
pub struct UserRegistry {
    users: HashMap<String, AclUser>,
}

impl UserRegistry {
    /// Create a registry seeded with the `default` user: `+@all`, `~*`,
    /// `on`, `nopass` applied in that order.
    pub fn init(ids: &mut CommandIdAllocator, table: &CommandTable) -> Self {
        let mut default = AclUser::new(DEFAULT_USER);
        apply_rules(
            &mut default,
            ids,
            table,
            [
                b"+@all".as_slice(),
                b"~*".as_slice(),
                b"on".as_slice(),
                b"nopass".as_slice(),
            ],
        )
        .expect("seeding the default user can never fail");

        let mut users = HashMap::new();
        users.insert(DEFAULT_USER.to_string(), default);
        Self { users }
    }

    pub fn create(&mut self, name: &str) -> Result<&mut AclUser, AlreadyExists> {
        if self.users.contains_key(name) {
            return Err(AlreadyExists);
        }
        self.users.insert(name.to_string(), AclUser::new(name));
        Ok(self.users.get_mut(name).unwrap())
    }

    /// Get the user, creating it first if absent — the behaviour
    /// `ACL SETUSER` needs: creating and modifying a user go through
    /// the same call, so a repeated `SETUSER` just layers more rules on.
    pub fn get_or_create(&mut self, name: &str) -> &mut AclUser {
        self.users
            .entry(name.to_string())
            .or_insert_with(|| AclUser::new(name))
    }

    pub fn lookup(&self, name: &str) -> Result<&AclUser, NotFound> {
        self.users.get(name).ok_or(NotFound)
    }

    pub fn lookup_mut(&mut self, name: &str) -> Result<&mut AclUser, NotFound> {
        self.users.get_mut(name).ok_or(NotFound)
    }

    /// Remove a user. Removing `default` is refused — it must always
    /// exist.
    pub fn delete(&mut self, name: &str) -> Result<(), NotFound> {
        if name == DEFAULT_USER {
            return Err(NotFound);
        }
        if self.users.remove(name).is_some() {
            Ok(())
        } else {
            Err(NotFound)
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.users.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AclUser> {
        self.users.values()
    }

    pub fn default_user(&self) -> &AclUser {
        self.users
            .get(DEFAULT_USER)
            .expect("default user must always exist")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (CommandIdAllocator, CommandTable) {
        (CommandIdAllocator::new(), CommandTable::builtin())
    }

    #[test]
    fn default_user_seeded_enabled_allkeys_allcommands_nopass() {
        let (mut ids, table) = setup();
        let reg = UserRegistry::init(&mut ids, &table);
        let default = reg.default_user();
        assert!(default.enabled());
        assert!(default.has_allkeys());
        assert!(default.has_allcommands());
        assert!(default.has_nopass());
    }

    #[test]
    fn default_user_cannot_be_deleted() {
        let (mut ids, table) = setup();
        let mut reg = UserRegistry::init(&mut ids, &table);
        assert!(reg.delete(DEFAULT_USER).is_err());
        assert!(reg.lookup(DEFAULT_USER).is_ok());
    }

    #[test]
    fn create_then_lookup() {
        let (mut ids, table) = setup();
        let mut reg = UserRegistry::init(&mut ids, &table);
        reg.create("alice").unwrap();
        assert!(reg.lookup("alice").is_ok());
        assert!(matches!(reg.create("alice"), Err(AlreadyExists)));
    }

    #[test]
    fn delete_removes_user() {
        let (mut ids, table) = setup();
        let mut reg = UserRegistry::init(&mut ids, &table);
        reg.create("bob").unwrap();
        reg.delete("bob").unwrap();
        assert!(matches!(reg.lookup("bob"), Err(NotFound)));
    }
}
