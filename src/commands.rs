//! Command registry — the external collaborator the ACL core consults
//! for each known command: it supplies a name, a `CommandKind`
//! tag (used in place of function-pointer identity to recognise the
//! authentication command), a first-key index and key-extraction rule,
//! and the set of categories the command belongs to.
//!
//! A concrete, static table is provided here (`CommandTable::builtin`)
//! so the crate is runnable end to end; nothing in `security::acl`
//! depends on this table being exhaustive or "the" Redis command set.

use std::collections::HashMap;

/// Command categories usable in `+@cat`/`-@cat` ACL rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Set,
    SortedSet,
    List,
    Hash,
    String,
    Bitmap,
    HyperLogLog,
    Stream,
    Admin,
    ReadOnly,
    ReadWrite,
    Fast,
    Slow,
    PubSub,
    All,
}

impl Category {
    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.strip_prefix('@').unwrap_or(s);
        Some(match s.to_ascii_lowercase().as_str() {
            "set" => Category::Set,
            "sortedset" | "zset" => Category::SortedSet,
            "list" => Category::List,
            "hash" => Category::Hash,
            "string" => Category::String,
            "bitmap" => Category::Bitmap,
            "hyperloglog" => Category::HyperLogLog,
            "stream" => Category::Stream,
            "admin" => Category::Admin,
            "readonly" => Category::ReadOnly,
            "readwrite" => Category::ReadWrite,
            "fast" => Category::Fast,
            "slow" => Category::Slow,
            "pubsub" => Category::PubSub,
            "all" => Category::All,
            _ => return None,
        })
    }
}

/// How the ACL's authentication-command special case is recognised —
/// commands of this kind always bypass the command permission gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Auth,
    Other,
}

/// Key-argument layout for a command, modeled after Redis's
/// firstkey/lastkey/keystep triple. `first_key == 0` means the command
/// has no keys at all.
#[derive(Debug, Clone, Copy)]
pub struct KeySpec {
    pub first_key: usize,
    /// Negative values count back from the end of argv (`-1` = last arg).
    pub last_key: isize,
    pub key_step: usize,
}

impl KeySpec {
    pub const NONE: KeySpec = KeySpec {
        first_key: 0,
        last_key: 0,
        key_step: 0,
    };

    pub fn has_keys(&self) -> bool {
        self.first_key != 0
    }

    /// Argv positions (1-indexed, argv[0] is the command name) that
    /// hold key arguments, given the full argument count.
    pub fn key_positions(&self, argc: usize) -> Vec<usize> {
        if !self.has_keys() || argc <= self.first_key {
            return Vec::new();
        }
        let last = if self.last_key < 0 {
            (argc as isize + self.last_key) as usize
        } else {
            (self.last_key as usize).min(argc - 1)
        };
        if last < self.first_key {
            return Vec::new();
        }
        (self.first_key..=last)
            .step_by(self.key_step.max(1))
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct CommandDescriptor {
    pub name: &'static str,
    pub kind: CommandKind,
    pub keys: KeySpec,
    pub categories: &'static [Category],
}

#[derive(Debug)]
pub struct CommandTable {
    by_name: HashMap<&'static str, CommandDescriptor>,
}

impl CommandTable {
    pub fn builtin() -> Self {
        use Category::*;
        use CommandKind::*;

        const SINGLE_KEY: KeySpec = KeySpec {
            first_key: 1,
            last_key: 1,
            key_step: 1,
        };
        const ALL_ARGS_AS_KEYS: KeySpec = KeySpec {
            first_key: 1,
            last_key: -1,
            key_step: 1,
        };

        let defs: &[(&str, CommandKind, KeySpec, &[Category])] = &[
            ("get", Other, SINGLE_KEY, &[String, ReadOnly, Fast]),
            ("set", Other, SINGLE_KEY, &[String, ReadWrite, Slow]),
            ("append", Other, SINGLE_KEY, &[String, ReadWrite, Fast]),
            ("strlen", Other, SINGLE_KEY, &[String, ReadOnly, Fast]),
            ("mget", Other, ALL_ARGS_AS_KEYS, &[String, ReadOnly, Fast]),
            ("incr", Other, SINGLE_KEY, &[String, ReadWrite, Fast]),
            ("decr", Other, SINGLE_KEY, &[String, ReadWrite, Fast]),
            ("del", Other, ALL_ARGS_AS_KEYS, &[ReadWrite, Slow]),
            ("exists", Other, ALL_ARGS_AS_KEYS, &[ReadOnly, Fast]),
            ("type", Other, SINGLE_KEY, &[ReadOnly, Fast]),
            ("keys", Other, KeySpec::NONE, &[ReadOnly, Slow]),
            ("expire", Other, SINGLE_KEY, &[ReadWrite, Fast]),
            ("ttl", Other, SINGLE_KEY, &[ReadOnly, Fast]),
            ("persist", Other, SINGLE_KEY, &[ReadWrite, Fast]),
            ("lpush", Other, SINGLE_KEY, &[List, ReadWrite, Fast]),
            ("rpush", Other, SINGLE_KEY, &[List, ReadWrite, Fast]),
            ("lpop", Other, SINGLE_KEY, &[List, ReadWrite, Fast]),
            ("rpop", Other, SINGLE_KEY, &[List, ReadWrite, Fast]),
            ("lrange", Other, SINGLE_KEY, &[List, ReadOnly, Slow]),
            ("llen", Other, SINGLE_KEY, &[List, ReadOnly, Fast]),
            ("sadd", Other, SINGLE_KEY, &[Set, ReadWrite, Fast]),
            ("srem", Other, SINGLE_KEY, &[Set, ReadWrite, Fast]),
            ("smembers", Other, SINGLE_KEY, &[Set, ReadOnly, Slow]),
            ("scard", Other, SINGLE_KEY, &[Set, ReadOnly, Fast]),
            ("hset", Other, SINGLE_KEY, &[Hash, ReadWrite, Fast]),
            ("hget", Other, SINGLE_KEY, &[Hash, ReadOnly, Fast]),
            ("hdel", Other, SINGLE_KEY, &[Hash, ReadWrite, Fast]),
            ("hgetall", Other, SINGLE_KEY, &[Hash, ReadOnly, Slow]),
            ("zadd", Other, SINGLE_KEY, &[SortedSet, ReadWrite, Fast]),
            ("zrange", Other, SINGLE_KEY, &[SortedSet, ReadOnly, Slow]),
            ("zscore", Other, SINGLE_KEY, &[SortedSet, ReadOnly, Fast]),
            ("setbit", Other, SINGLE_KEY, &[Bitmap, ReadWrite, Slow]),
            ("getbit", Other, SINGLE_KEY, &[Bitmap, ReadOnly, Fast]),
            ("pfadd", Other, SINGLE_KEY, &[HyperLogLog, ReadWrite, Fast]),
            (
                "pfcount",
                Other,
                ALL_ARGS_AS_KEYS,
                &[HyperLogLog, ReadOnly, Slow],
            ),
            ("xadd", Other, SINGLE_KEY, &[Stream, ReadWrite, Fast]),
            ("xrange", Other, SINGLE_KEY, &[Stream, ReadOnly, Slow]),
            ("config", Other, KeySpec::NONE, &[Admin, Slow]),
            ("debug", Other, KeySpec::NONE, &[Admin, Slow]),
            ("shutdown", Other, KeySpec::NONE, &[Admin, Slow]),
            ("flushall", Other, KeySpec::NONE, &[Admin, Slow]),
            ("flushdb", Other, KeySpec::NONE, &[Admin, Slow]),
            ("ping", Other, KeySpec::NONE, &[Fast]),
            ("echo", Other, KeySpec::NONE, &[Fast]),
            ("select", Other, KeySpec::NONE, &[Fast]),
            ("auth", Auth, KeySpec::NONE, &[Fast]),
            ("subscribe", Other, KeySpec::NONE, &[PubSub, Fast]),
            ("publish", Other, KeySpec::NONE, &[PubSub, Fast]),
            ("acl", Other, KeySpec::NONE, &[Admin, Slow]),
        ];

        let mut by_name = HashMap::new();
        for &(name, kind, keys, categories) in defs {
            by_name.insert(
                name,
                CommandDescriptor {
                    name,
                    kind,
                    keys,
                    categories,
                },
            );
        }
        Self { by_name }
    }

    pub fn get(&self, name: &str) -> Option<&CommandDescriptor> {
        self.by_name.get(name.to_ascii_lowercase().as_str())
    }

    pub fn category_from_str(&self, s: &str) -> Option<Category> {
        Category::from_str(s)
    }

    /// Names of every registered command carrying `category` (or, for
    /// `Category::All`, every registered command).
    pub fn commands_in_category(&self, category: Category) -> Vec<&'static str> {
        if matches!(category, Category::All) {
            return self.by_name.keys().copied().collect();
        }
        self.by_name
            .values()
            .filter(|d| d.categories.contains(&category))
            .map(|d| d.name)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_command_is_tagged() {
        let table = CommandTable::builtin();
        assert_eq!(table.get("auth").unwrap().kind, CommandKind::Auth);
        assert_eq!(table.get("AUTH").unwrap().kind, CommandKind::Auth);
        assert_eq!(table.get("get").unwrap().kind, CommandKind::Other);
    }

    #[test]
    fn single_key_spec_extracts_one_position() {
        let spec = KeySpec {
            first_key: 1,
            last_key: 1,
            key_step: 1,
        };
        assert_eq!(spec.key_positions(2), vec![1]);
    }

    #[test]
    fn all_args_key_spec_extracts_to_end() {
        let spec = KeySpec {
            first_key: 1,
            last_key: -1,
            key_step: 1,
        };
        assert_eq!(spec.key_positions(4), vec![1, 2, 3]);
    }

    #[test]
    fn no_keys_spec_extracts_nothing() {
        assert!(KeySpec::NONE.key_positions(5).is_empty());
        assert!(!KeySpec::NONE.has_keys());
    }

    #[test]
    fn category_lookup_matches_members() {
        let table = CommandTable::builtin();
        let strings = table.commands_in_category(Category::String);
        assert!(strings.contains(&"get"));
        assert!(!strings.contains(&"lpush"));
    }

    #[test]
    fn all_category_returns_every_command() {
        let table = CommandTable::builtin();
        assert_eq!(table.commands_in_category(Category::All).len(), table.len());
    }
}
